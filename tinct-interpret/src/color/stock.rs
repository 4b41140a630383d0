use crate::color::special::PatternSpace;
use crate::color::{ColorSpace, ColorSpaceType, Family};
use std::sync::OnceLock;

/// The color spaces that can be referenced by name alone.
///
/// Loading `/DeviceRGB` (or `[/DeviceRGB]`) always yields the same shared instance
/// instead of a fresh color space.
#[derive(Debug, Clone)]
pub struct StockColorSpaces {
    gray: ColorSpace,
    rgb: ColorSpace,
    cmyk: ColorSpace,
    pattern: ColorSpace,
}

impl Default for StockColorSpaces {
    fn default() -> Self {
        Self::new()
    }
}

impl StockColorSpaces {
    /// Create a new set of stock color spaces that isn't shared with anyone.
    pub fn new() -> Self {
        Self {
            gray: ColorSpace::new(ColorSpaceType::DeviceGray),
            rgb: ColorSpace::new(ColorSpaceType::DeviceRgb),
            cmyk: ColorSpace::new(ColorSpaceType::DeviceCmyk),
            pattern: ColorSpace::new(ColorSpaceType::Pattern(PatternSpace::stock())),
        }
    }

    /// Return the process-wide set of stock color spaces.
    pub fn global() -> &'static Self {
        static STOCK: OnceLock<StockColorSpaces> = OnceLock::new();

        STOCK.get_or_init(Self::new)
    }

    /// Return the stock color space of a family.
    ///
    /// Only `DeviceGray`, `DeviceRGB`, `DeviceCMYK` and `Pattern` have a stock instance.
    pub fn get(&self, family: Family) -> Option<ColorSpace> {
        match family {
            Family::DeviceGray => Some(self.gray.clone()),
            Family::DeviceRgb => Some(self.rgb.clone()),
            Family::DeviceCmyk => Some(self.cmyk.clone()),
            Family::Pattern => Some(self.pattern.clone()),
            _ => None,
        }
    }

    /// Return the stock color space with the given name, including the abbreviations
    /// used by inline images.
    pub fn get_by_name(&self, name: &[u8]) -> Option<ColorSpace> {
        let family = match name {
            b"DeviceRGB" | b"RGB" => Family::DeviceRgb,
            b"DeviceGray" | b"G" => Family::DeviceGray,
            b"DeviceCMYK" | b"CMYK" => Family::DeviceCmyk,
            b"Pattern" => Family::Pattern,
            _ => return None,
        };

        self.get(family)
    }

    /// Return the device color space with the given number of components.
    pub(crate) fn for_component_count(&self, count: usize) -> Option<ColorSpace> {
        match count {
            1 => Some(self.gray.clone()),
            3 => Some(self.rgb.clone()),
            4 => Some(self.cmyk.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StockColorSpaces;
    use crate::color::Family;

    #[test]
    fn lookup() {
        let stock = StockColorSpaces::new();

        assert!(stock.get(Family::DeviceRgb).unwrap().ptr_eq(&stock.get_by_name(b"RGB").unwrap()));
        assert!(stock.get(Family::Lab).is_none());
        assert!(stock.get_by_name(b"Indexed").is_none());
        assert_eq!(stock.for_component_count(4).unwrap().family(), Family::DeviceCmyk);
        assert!(stock.for_component_count(2).is_none());
    }

    #[test]
    fn independent_sets() {
        let a = StockColorSpaces::new();
        let b = StockColorSpaces::new();

        assert!(!a.get(Family::DeviceGray).unwrap().ptr_eq(&b.get(Family::DeviceGray).unwrap()));

        let global = StockColorSpaces::global();
        assert!(global.get(Family::Pattern).unwrap().ptr_eq(&StockColorSpaces::global().get(Family::Pattern).unwrap()));
        assert!(global.get(Family::Pattern).unwrap().pattern_base().is_none());
    }
}
