use crate::function::Values;
use crate::util::OptionLog;
use log::{error, warn};
use std::array;
use tinct_syntax::object::Stream;

/// The maximum number of operands the calculator stack can hold.
const STACK_LIMIT: usize = 100;
/// The maximum nesting depth of procedures.
const NESTING_LIMIT: usize = 32;

/// A type 4 function (PostScript calculator function).
pub(crate) struct Type4 {
    program: Vec<Instruction>,
}

impl Type4 {
    /// Create a new type 4 function.
    pub(crate) fn new(stream: &Stream<'_>) -> Option<Self> {
        let program = parse_program(stream.decoded())
            .warn_none("failed to parse postscript calculator function")?;

        Some(Self { program })
    }

    /// Evaluate the function with the given input and return the topmost
    /// `output_count` values of the stack.
    pub(crate) fn eval(&self, input: &[f32], output_count: usize) -> Option<Values> {
        let stack = self.run(input)?;
        let items = stack.items();

        let Some(start) = items.len().checked_sub(output_count) else {
            warn!("postscript calculator function left too few values on the stack");

            return None;
        };

        Some(items[start..].iter().map(Argument::as_f32).collect())
    }

    fn run(&self, input: &[f32]) -> Option<OperandStack> {
        let mut stack = OperandStack::new();

        for value in input {
            stack.push(Argument::Float(*value))?;
        }

        execute(&self.program, &mut stack)?;

        Some(stack)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Argument {
    Float(f32),
    Bool(bool),
}

impl Default for Argument {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

impl Argument {
    fn as_bool(&self) -> bool {
        match self {
            Self::Float(f) => *f != 0.0,
            Self::Bool(b) => *b,
        }
    }

    fn as_f32(&self) -> f32 {
        match self {
            Self::Float(f) => *f,
            Self::Bool(b) => f32::from(u8::from(*b)),
        }
    }

    fn as_i32(&self) -> i32 {
        self.as_f32() as i32
    }
}

struct ArgumentsStack<T: Default, const C: usize> {
    stack: [T; C],
    len: usize,
}

impl<T: Default + Copy, const C: usize> ArgumentsStack<T, C> {
    fn new() -> Self {
        Self {
            stack: array::from_fn(|_| T::default()),
            len: 0,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn push(&mut self, n: T) -> Option<()> {
        if self.len == C {
            error!("overflowed postscript operand stack");

            return None;
        }

        self.stack[self.len] = n;
        self.len += 1;

        Some(())
    }

    #[inline]
    fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            error!("underflowed postscript operand stack");

            return None;
        }

        self.len -= 1;

        Some(self.stack[self.len])
    }

    /// Return the item `depth` positions below the top of the stack.
    #[inline]
    fn peek(&self, depth: usize) -> Option<T> {
        let index = self.len.checked_sub(depth + 1)?;

        Some(self.stack[index])
    }

    #[inline]
    fn items(&self) -> &[T] {
        &self.stack[..self.len]
    }

    #[inline]
    fn items_mut(&mut self) -> &mut [T] {
        &mut self.stack[..self.len]
    }
}

type OperandStack = ArgumentsStack<Argument, STACK_LIMIT>;

#[derive(Debug, Clone, PartialEq)]
enum Instruction {
    Push(Argument),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Stack(StackOp),
    If(Vec<Instruction>),
    IfElse(Vec<Instruction>, Vec<Instruction>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Abs,
    Ceiling,
    Cos,
    Cvi,
    Cvr,
    Floor,
    Ln,
    Log,
    Neg,
    Not,
    Round,
    Sin,
    Sqrt,
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    And,
    Atan,
    Bitshift,
    Div,
    Eq,
    Exp,
    Ge,
    Gt,
    Idiv,
    Le,
    Lt,
    Mod,
    Mul,
    Ne,
    Or,
    Sub,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StackOp {
    Copy,
    Dup,
    Exch,
    Index,
    Pop,
    Roll,
}

impl UnaryOp {
    fn apply(self, arg: Argument) -> Argument {
        let n = arg.as_f32();

        let res = match self {
            Self::Abs => n.abs(),
            Self::Ceiling => n.ceil(),
            Self::Cos => n.to_radians().cos(),
            Self::Cvi | Self::Truncate => n.trunc(),
            Self::Cvr => n,
            Self::Floor => n.floor(),
            Self::Ln => n.ln(),
            Self::Log => n.log10(),
            Self::Neg => -n,
            Self::Not => {
                return match arg {
                    Argument::Bool(b) => Argument::Bool(!b),
                    Argument::Float(f) => Argument::Float(!(f as i32) as f32),
                };
            }
            // Halfway cases are rounded towards positive infinity.
            Self::Round => (n + 0.5).floor(),
            Self::Sin => n.to_radians().sin(),
            Self::Sqrt => n.sqrt(),
        };

        Argument::Float(res)
    }
}

impl BinaryOp {
    fn apply(self, a1: Argument, a2: Argument) -> Option<Argument> {
        let (n1, n2) = (a1.as_f32(), a2.as_f32());
        let both_bool = matches!((a1, a2), (Argument::Bool(_), Argument::Bool(_)));

        let logical = |f: fn(bool, bool) -> bool, i: fn(i32, i32) -> i32| {
            if both_bool {
                Argument::Bool(f(a1.as_bool(), a2.as_bool()))
            } else {
                Argument::Float(i(a1.as_i32(), a2.as_i32()) as f32)
            }
        };

        let res = match self {
            Self::Add => Argument::Float(n1 + n2),
            Self::Sub => Argument::Float(n1 - n2),
            Self::Mul => Argument::Float(n1 * n2),
            Self::Div => Argument::Float(n1 / n2),
            Self::Idiv => Argument::Float(a1.as_i32().checked_div(a2.as_i32())? as f32),
            Self::Mod => Argument::Float(a1.as_i32().checked_rem(a2.as_i32())? as f32),
            Self::Exp => Argument::Float(n1.powf(n2)),
            Self::Atan => {
                let mut res = n1.atan2(n2).to_degrees() % 360.0;

                if res < 0.0 {
                    res += 360.0;
                }

                Argument::Float(res)
            }
            Self::And => logical(|b1, b2| b1 && b2, |i1, i2| i1 & i2),
            Self::Or => logical(|b1, b2| b1 || b2, |i1, i2| i1 | i2),
            Self::Xor => logical(|b1, b2| b1 ^ b2, |i1, i2| i1 ^ i2),
            Self::Bitshift => {
                let num = a1.as_i32();
                let shift = a2.as_i32();

                let res = if shift >= 0 {
                    num.checked_shl(shift as u32).unwrap_or(0)
                } else {
                    num.checked_shr(shift.unsigned_abs()).unwrap_or(0)
                };

                Argument::Float(res as f32)
            }
            Self::Eq => Argument::Bool(n1 == n2),
            Self::Ne => Argument::Bool(n1 != n2),
            Self::Ge => Argument::Bool(n1 >= n2),
            Self::Gt => Argument::Bool(n1 > n2),
            Self::Le => Argument::Bool(n1 <= n2),
            Self::Lt => Argument::Bool(n1 < n2),
        };

        Some(res)
    }
}

fn execute(program: &[Instruction], stack: &mut OperandStack) -> Option<()> {
    for instruction in program {
        match instruction {
            Instruction::Push(arg) => stack.push(*arg)?,
            Instruction::Unary(op) => {
                let arg = stack.pop()?;
                stack.push(op.apply(arg))?;
            }
            Instruction::Binary(op) => {
                let a2 = stack.pop()?;
                let a1 = stack.pop()?;
                stack.push(op.apply(a1, a2)?)?;
            }
            Instruction::Stack(op) => execute_stack_op(*op, stack)?,
            Instruction::If(proc) => {
                if stack.pop()?.as_bool() {
                    execute(proc, stack)?;
                }
            }
            Instruction::IfElse(if_proc, else_proc) => {
                if stack.pop()?.as_bool() {
                    execute(if_proc, stack)?;
                } else {
                    execute(else_proc, stack)?;
                }
            }
        }
    }

    Some(())
}

fn execute_stack_op(op: StackOp, stack: &mut OperandStack) -> Option<()> {
    match op {
        StackOp::Copy => {
            let n = usize::try_from(stack.pop()?.as_i32()).ok()?;
            let start = stack.len().checked_sub(n)?;

            for i in start..start + n {
                stack.push(stack.items()[i])?;
            }
        }
        StackOp::Dup => stack.push(stack.peek(0)?)?,
        StackOp::Exch => {
            let n2 = stack.pop()?;
            let n1 = stack.pop()?;

            stack.push(n2)?;
            stack.push(n1)?;
        }
        StackOp::Index => {
            let n = usize::try_from(stack.pop()?.as_i32()).ok()?;
            stack.push(stack.peek(n)?)?;
        }
        StackOp::Pop => {
            stack.pop()?;
        }
        StackOp::Roll => {
            let j = stack.pop()?.as_i32();
            let n = usize::try_from(stack.pop()?.as_i32()).ok()?;
            let start = stack.len().checked_sub(n)?;
            let target = &mut stack.items_mut()[start..];

            if target.is_empty() {
                return Some(());
            }

            let shift = j.unsigned_abs() as usize % target.len();

            if j >= 0 {
                target.rotate_right(shift);
            } else {
                target.rotate_left(shift);
            }
        }
    }

    Some(())
}

fn parse_program(data: &[u8]) -> Option<Vec<Instruction>> {
    let mut tokens = Tokenizer { data, pos: 0 };

    if tokens.next()? != Token::Open {
        return None;
    }

    let program = parse_procedure(&mut tokens, 0)?;

    // Only whitespace may follow the outermost procedure.
    tokens.next().is_none().then_some(program)
}

fn parse_procedure(tokens: &mut Tokenizer<'_>, depth: usize) -> Option<Vec<Instruction>> {
    if depth > NESTING_LIMIT {
        warn!("postscript procedures are nested too deeply");

        return None;
    }

    let mut program = vec![];
    // Procedures are only valid as operands of `if` and `ifelse`.
    let mut pending: Vec<Vec<Instruction>> = vec![];

    loop {
        let operator = match tokens.next()? {
            Token::Close => break,
            Token::Open => {
                pending.push(parse_procedure(tokens, depth + 1)?);

                continue;
            }
            Token::Number(n) => {
                program.push(Instruction::Push(Argument::Float(n)));

                continue;
            }
            Token::Operator(op) => op,
        };

        let instruction = match operator {
            b"if" => {
                let proc = pending.pop()?;

                Instruction::If(proc)
            }
            b"ifelse" => {
                let else_proc = pending.pop()?;
                let if_proc = pending.pop()?;

                Instruction::IfElse(if_proc, else_proc)
            }
            other => parse_operator(other)?,
        };

        if !pending.is_empty() {
            warn!("postscript procedure without conditional operator");

            return None;
        }

        program.push(instruction);
    }

    pending.is_empty().then_some(program)
}

fn parse_operator(name: &[u8]) -> Option<Instruction> {
    use Instruction::{Binary, Push, Stack, Unary};

    let instruction = match name {
        b"true" => Push(Argument::Bool(true)),
        b"false" => Push(Argument::Bool(false)),
        b"abs" => Unary(UnaryOp::Abs),
        b"ceiling" => Unary(UnaryOp::Ceiling),
        b"cos" => Unary(UnaryOp::Cos),
        b"cvi" => Unary(UnaryOp::Cvi),
        b"cvr" => Unary(UnaryOp::Cvr),
        b"floor" => Unary(UnaryOp::Floor),
        b"ln" => Unary(UnaryOp::Ln),
        b"log" => Unary(UnaryOp::Log),
        b"neg" => Unary(UnaryOp::Neg),
        b"not" => Unary(UnaryOp::Not),
        b"round" => Unary(UnaryOp::Round),
        b"sin" => Unary(UnaryOp::Sin),
        b"sqrt" => Unary(UnaryOp::Sqrt),
        b"truncate" => Unary(UnaryOp::Truncate),
        b"add" => Binary(BinaryOp::Add),
        b"and" => Binary(BinaryOp::And),
        b"atan" => Binary(BinaryOp::Atan),
        b"bitshift" => Binary(BinaryOp::Bitshift),
        b"div" => Binary(BinaryOp::Div),
        b"eq" => Binary(BinaryOp::Eq),
        b"exp" => Binary(BinaryOp::Exp),
        b"ge" => Binary(BinaryOp::Ge),
        b"gt" => Binary(BinaryOp::Gt),
        b"idiv" => Binary(BinaryOp::Idiv),
        b"le" => Binary(BinaryOp::Le),
        b"lt" => Binary(BinaryOp::Lt),
        b"mod" => Binary(BinaryOp::Mod),
        b"mul" => Binary(BinaryOp::Mul),
        b"ne" => Binary(BinaryOp::Ne),
        b"or" => Binary(BinaryOp::Or),
        b"sub" => Binary(BinaryOp::Sub),
        b"xor" => Binary(BinaryOp::Xor),
        b"copy" => Stack(StackOp::Copy),
        b"dup" => Stack(StackOp::Dup),
        b"exch" => Stack(StackOp::Exch),
        b"index" => Stack(StackOp::Index),
        b"pop" => Stack(StackOp::Pop),
        b"roll" => Stack(StackOp::Roll),
        _ => {
            warn!(
                "encountered unknown postscript operator {}",
                String::from_utf8_lossy(name)
            );

            return None;
        }
    };

    Some(instruction)
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Open,
    Close,
    Number(f32),
    Operator(&'a [u8]),
}

struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn skip_white_spaces_and_comments(&mut self) {
        while let Some(b) = self.data.get(self.pos) {
            if b.is_ascii_whitespace() || *b == 0 {
                self.pos += 1;
            } else if *b == b'%' {
                while self.data.get(self.pos).is_some_and(|b| !matches!(b, b'\n' | b'\r')) {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next(&mut self) -> Option<Token<'a>> {
        self.skip_white_spaces_and_comments();

        let first = *self.data.get(self.pos)?;

        match first {
            b'{' => {
                self.pos += 1;

                return Some(Token::Open);
            }
            b'}' => {
                self.pos += 1;

                return Some(Token::Close);
            }
            _ => {}
        }

        let start = self.pos;

        while self
            .data
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace() && !matches!(b, b'{' | b'}' | b'%'))
        {
            self.pos += 1;
        }

        let token = &self.data[start..self.pos];

        if matches!(first, b'+' | b'-' | b'.' | b'0'..=b'9') {
            let number = std::str::from_utf8(token).ok()?.parse::<f32>().ok();

            return number.map(Token::Number).warn_none("invalid number in postscript function");
        }

        Some(Token::Operator(token))
    }
}

#[cfg(test)]
mod tests {
    use crate::function::Function;
    use crate::function::type4::{
        Argument, BinaryOp, Instruction, StackOp, Type4, UnaryOp, parse_program,
    };
    use std::f32::consts::LN_10;
    use tinct_syntax::object::Object;

    #[test]
    fn lex_1() {
        let program = b"{ copy dup 2.0 exch roll }";
        let parsed = parse_program(program).unwrap();

        assert_eq!(
            parsed,
            vec![
                Instruction::Stack(StackOp::Copy),
                Instruction::Stack(StackOp::Dup),
                Instruction::Push(Argument::Float(2.0)),
                Instruction::Stack(StackOp::Exch),
                Instruction::Stack(StackOp::Roll),
            ]
        );
    }

    #[test]
    fn lex_2() {
        let program = b"{ 360 mul sin % a comment\n 2 div 0.5 add }";
        let parsed = parse_program(program).unwrap();

        assert_eq!(
            parsed,
            vec![
                Instruction::Push(Argument::Float(360.0)),
                Instruction::Binary(BinaryOp::Mul),
                Instruction::Unary(UnaryOp::Sin),
                Instruction::Push(Argument::Float(2.0)),
                Instruction::Binary(BinaryOp::Div),
                Instruction::Push(Argument::Float(0.5)),
                Instruction::Binary(BinaryOp::Add),
            ]
        );
    }

    #[test]
    fn lex_3() {
        let program = b" {  {dup exch} if {0} {1} ifelse }";
        let parsed = parse_program(program).unwrap();

        assert_eq!(
            parsed,
            vec![
                Instruction::If(vec![
                    Instruction::Stack(StackOp::Dup),
                    Instruction::Stack(StackOp::Exch)
                ]),
                Instruction::IfElse(
                    vec![Instruction::Push(Argument::Float(0.0))],
                    vec![Instruction::Push(Argument::Float(1.0))]
                )
            ]
        );
    }

    #[test]
    fn lex_invalid() {
        assert!(parse_program(b"{ 1 2 foo }").is_none());
        assert!(parse_program(b"{ 1 2 add").is_none());
        assert!(parse_program(b"1 2 add }").is_none());
        assert!(parse_program(b"{ {1} 2 add }").is_none());
        assert!(parse_program(b"{ if }").is_none());
        assert!(parse_program(b"{ 1 } 2").is_none());
    }

    fn op_impl(prog: &str, out: &[f32]) {
        let procedure = format!("{{{prog}}}");
        let type4 = Type4 {
            program: parse_program(procedure.as_bytes()).unwrap(),
        };

        let stack = type4.run(&[]).unwrap();
        let res = stack.items().iter().map(Argument::as_f32).collect::<Vec<_>>();

        assert_eq!(res.as_slice(), out);
    }

    #[test]
    fn op_abs() {
        op_impl("4.5 abs", &[4.5]);
        op_impl("-3 abs", &[3.0]);
        op_impl("0 abs", &[0.0]);
    }

    #[test]
    fn op_add() {
        op_impl("3 4 add", &[7.0]);
        op_impl("9.9 1.1 add", &[11.0]);
    }

    #[test]
    fn op_atan() {
        op_impl("0 1 atan", &[0.0]);
        op_impl("1 0 atan", &[90.0]);
        op_impl("-100 0 atan", &[270.0]);
        op_impl("4 4 atan", &[45.0]);
    }

    #[test]
    fn op_ceiling() {
        op_impl("3.2 ceiling", &[4.0]);
        op_impl("-4.8 ceiling", &[-4.0]);
        op_impl("99 ceiling", &[99.0]);
    }

    #[test]
    fn op_cos() {
        op_impl("0 cos", &[1.0]);
        // Not exactly zero because of floating point imprecision.
        op_impl("90 cos", &[-4.371139e-8]);
    }

    #[test]
    fn op_cvi() {
        op_impl("-47.8 cvi", &[-47.0]);
        op_impl("520.9 cvi", &[520.0]);
    }

    #[test]
    fn op_cvr() {
        op_impl("-47.8 cvr", &[-47.8]);
        op_impl("520 cvr", &[520.0]);
    }

    #[test]
    fn op_div() {
        op_impl("3 2 div", &[1.5]);
        op_impl("4 2 div", &[2.0]);
    }

    #[test]
    fn op_exp() {
        op_impl("9 0.5 exp", &[3.0]);
        op_impl("-9 -1 exp", &[-0.11111111]);
    }

    #[test]
    fn op_floor() {
        op_impl("3.2 floor", &[3.0]);
        op_impl("-4.8 floor", &[-5.0]);
        op_impl("99 floor", &[99.0]);
    }

    #[test]
    fn op_idiv() {
        op_impl("3 2 idiv", &[1.0]);
        op_impl("4 2 idiv", &[2.0]);
        op_impl("-5 2 idiv", &[-2.0]);
    }

    #[test]
    fn op_idiv_by_zero() {
        let type4 = Type4 {
            program: parse_program(b"{ 3 0 idiv }").unwrap(),
        };

        assert!(type4.run(&[]).is_none());
    }

    #[test]
    fn op_ln() {
        op_impl("10 ln", &[LN_10]);
        op_impl("100 ln", &[4.6051702]);
    }

    #[test]
    fn op_log() {
        op_impl("10 log", &[1.0]);
        op_impl("100 log", &[2.0]);
    }

    #[test]
    fn op_mod() {
        op_impl("5 3 mod", &[2.0]);
        op_impl("5 2 mod", &[1.0]);
        op_impl("-5 3 mod", &[-2.0]);
    }

    #[test]
    fn op_mul() {
        op_impl("5 3 mul", &[15.0]);
        op_impl("-2 6 mul", &[-12.0]);
    }

    #[test]
    fn op_neg() {
        op_impl("4.5 neg", &[-4.5]);
        op_impl("-3 neg", &[3.0]);
    }

    #[test]
    fn op_round() {
        op_impl("3.2 round", &[3.0]);
        op_impl("6.5 round", &[7.0]);
        op_impl("-4.8 round", &[-5.0]);
        op_impl("-6.5 round", &[-6.0]);
        op_impl("99 round", &[99.0]);
    }

    #[test]
    fn op_sin() {
        op_impl("0.0 sin", &[0.0]);
        op_impl("90.0 sin", &[1.0]);
    }

    #[test]
    fn op_sqrt() {
        op_impl("100 sqrt", &[10.0]);
    }

    #[test]
    fn op_sub() {
        op_impl("3 4 sub", &[-1.0]);
        op_impl("6 0 sub", &[6.0]);
    }

    #[test]
    fn op_truncate() {
        op_impl("3.2 truncate", &[3.0]);
        op_impl("-4.8 truncate", &[-4.0]);
        op_impl("99 truncate", &[99.0]);
    }

    #[test]
    fn op_and() {
        op_impl("true true and", &[1.0]);
        op_impl("true false and", &[0.0]);
        op_impl("false true and", &[0.0]);
        op_impl("false false and", &[0.0]);
        op_impl("99 1 and", &[1.0]);
        op_impl("52 7 and", &[4.0]);
    }

    #[test]
    fn op_bitshift() {
        op_impl("7 3 bitshift", &[56.0]);
        op_impl("142 -3 bitshift", &[17.0]);
        op_impl("1 40 bitshift", &[0.0]);
    }

    #[test]
    fn op_eq() {
        op_impl("4.0 4 eq", &[1.0]);
        op_impl("-2.0 -3 eq", &[0.0]);
    }

    #[test]
    fn op_false() {
        op_impl("false", &[0.0]);
    }

    #[test]
    fn op_ge() {
        op_impl("4.2 4 ge", &[1.0]);
        op_impl("4.2 4.2 ge", &[1.0]);
        op_impl("4.2 6 ge", &[0.0]);
    }

    #[test]
    fn op_gt() {
        op_impl("4.2 4 gt", &[1.0]);
        op_impl("4.2 4.2 gt", &[0.0]);
        op_impl("4.2 6 gt", &[0.0]);
    }

    #[test]
    fn op_le() {
        op_impl("4.2 4 le", &[0.0]);
        op_impl("4.2 4.2 le", &[1.0]);
        op_impl("4.2 6 le", &[1.0]);
    }

    #[test]
    fn op_lt() {
        op_impl("4.2 4 lt", &[0.0]);
        op_impl("4.2 4.2 lt", &[0.0]);
        op_impl("4.2 6 lt", &[1.0]);
    }

    #[test]
    fn op_ne() {
        op_impl("3.0 3 ne", &[0.0]);
        op_impl("3.0 3.0 ne", &[0.0]);
        op_impl("3.0 3.1 ne", &[1.0]);
    }

    #[test]
    fn op_not() {
        op_impl("true not", &[0.0]);
        op_impl("false not", &[1.0]);
        op_impl("52 not", &[-53.0]);
    }

    #[test]
    fn op_or() {
        op_impl("true true or", &[1.0]);
        op_impl("true false or", &[1.0]);
        op_impl("false true or", &[1.0]);
        op_impl("false false or", &[0.0]);
        op_impl("17 5 or", &[21.0]);
    }

    #[test]
    fn op_xor() {
        op_impl("true true xor", &[0.0]);
        op_impl("true false xor", &[1.0]);
        op_impl("false true xor", &[1.0]);
        op_impl("false false xor", &[0.0]);
        op_impl("7 3 xor", &[4.0]);
        op_impl("12 3 xor", &[15.0]);
    }

    #[test]
    fn op_if() {
        op_impl("true { 1.0 } if", &[1.0]);
        op_impl("false { 1.0 } if", &[]);
        op_impl("1 2 lt { 3 } if", &[3.0]);
    }

    #[test]
    fn op_ifelse() {
        op_impl("true { 1.0 } { 2.0 } ifelse", &[1.0]);
        op_impl("false { 1.0 } { 2.0 } ifelse", &[2.0]);
        op_impl("0.5 dup 0.25 gt { 2 mul } { 2 div } ifelse", &[1.0]);
    }

    #[test]
    fn op_copy() {
        op_impl("1 2 3 2 copy", &[1.0, 2.0, 3.0, 2.0, 3.0]);
        op_impl("1 2 3 0 copy", &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn op_dup() {
        op_impl("1 2 3 dup", &[1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn op_exch() {
        op_impl("1 2 3 exch", &[1.0, 3.0, 2.0]);
    }

    #[test]
    fn op_index() {
        op_impl("1 2 3 4 0 index", &[1.0, 2.0, 3.0, 4.0, 4.0]);
        op_impl("1 2 3 4 3 index", &[1.0, 2.0, 3.0, 4.0, 1.0]);
    }

    #[test]
    fn op_pop() {
        op_impl("1 2 3 pop", &[1.0, 2.0]);
    }

    #[test]
    fn op_roll() {
        op_impl("1 2 3 3 -1 roll", &[2.0, 3.0, 1.0]);
        op_impl("1 2 3 3 1 roll", &[3.0, 1.0, 2.0]);
        op_impl("1 2 3 3 0 roll", &[1.0, 2.0, 3.0]);
        op_impl("1 2 3 3 5 roll", &[2.0, 3.0, 1.0]);
        op_impl("0 2 roll", &[]);
        op_impl(
            "1 2 3 4 5 6 7 5 2 roll",
            &[1.0, 2.0, 6.0, 7.0, 3.0, 4.0, 5.0],
        );
    }

    #[test]
    fn stack_limit() {
        let program = format!("{{ {} }}", "1 ".repeat(101));
        let type4 = Type4 {
            program: parse_program(program.as_bytes()).unwrap(),
        };

        assert!(type4.run(&[]).is_none());
    }

    fn postscript(dict: &str, program: &str) -> Function {
        let data = format!(
            "{} stream\n{program}\nendstream",
            dict.replace(">>", &format!("/Length {} >>", program.len()))
        );

        Function::new(&Object::from_bytes(data.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn domain() {
        let f = postscript(
            "<< /FunctionType 4 /Domain [-5 5 -5 5 -5 5] /Range [-10 10 -10 10 -10 10] >>",
            "{ }",
        );

        assert_eq!(f.eval(&[-10.0, -2.0, 6.0]).unwrap().as_slice(), &[-5.0, -2.0, 5.0]);
    }

    #[test]
    fn range() {
        let f = postscript(
            "<< /FunctionType 4 /Domain [0 1] /Range [0 1 0 1] >>",
            "{ dup 2 mul }",
        );

        assert_eq!(f.eval(&[0.75]).unwrap().as_slice(), &[0.75, 1.0]);
    }

    #[test]
    fn too_few_outputs() {
        let f = postscript(
            "<< /FunctionType 4 /Domain [0 1] /Range [0 1 0 1] >>",
            "{ pop 1 }",
        );

        assert!(f.eval(&[0.5]).is_none());
    }
}
