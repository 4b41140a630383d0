use crate::color::Rgb;

pub(crate) fn gray_to_rgb(gray: f32) -> Rgb {
    Rgb::gray(gray.clamp(0.0, 1.0))
}

pub(crate) fn rgb_to_rgb(components: &[f32]) -> Rgb {
    Rgb::new(
        components[0].clamp(0.0, 1.0),
        components[1].clamp(0.0, 1.0),
        components[2].clamp(0.0, 1.0),
    )
}

pub(crate) fn cmyk_to_rgb(components: &[f32], std_conversion: bool) -> Rgb {
    let [c, m, y, k] = [0, 1, 2, 3].map(|i| components[i].clamp(0.0, 1.0));

    if std_conversion {
        Rgb::new(
            1.0 - (c + k).min(1.0),
            1.0 - (m + k).min(1.0),
            1.0 - (y + k).min(1.0),
        )
    } else {
        Rgb::new((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
    }
}

pub(crate) fn replicate_gray(dest: &mut [u8], src: &[u8], pixels: usize) {
    for (gray, bgr) in src.iter().zip(dest.chunks_exact_mut(3)).take(pixels) {
        bgr.fill(*gray);
    }
}

pub(crate) fn reverse_rgb(dest: &mut [u8], src: &[u8], pixels: usize) {
    for (rgb, bgr) in src
        .chunks_exact(3)
        .zip(dest.chunks_exact_mut(3))
        .take(pixels)
    {
        bgr.copy_from_slice(&[rgb[2], rgb[1], rgb[0]]);
    }
}

pub(crate) fn translate_cmyk(
    dest: &mut [u8],
    src: &[u8],
    pixels: usize,
    trans_mask: bool,
    std_conversion: bool,
) {
    for (cmyk, out) in src
        .chunks_exact(4)
        .zip(dest.chunks_exact_mut(3))
        .take(pixels)
    {
        let [c, m, y, k] = [cmyk[0], cmyk[1], cmyk[2], cmyk[3]].map(u32::from);

        if trans_mask {
            // Soft masks only care about the combined value, so the channels keep
            // the order of the source.
            let inv_k = 255 - k;
            out[0] = ((255 - c) * inv_k / 255) as u8;
            out[1] = ((255 - m) * inv_k / 255) as u8;
            out[2] = ((255 - y) * inv_k / 255) as u8;
        } else if std_conversion {
            out[2] = (255 - (c + k).min(255)) as u8;
            out[1] = (255 - (m + k).min(255)) as u8;
            out[0] = (255 - (y + k).min(255)) as u8;
        } else {
            let inv_k = 255 - k;
            out[2] = ((255 - c) * inv_k / 255) as u8;
            out[1] = ((255 - m) * inv_k / 255) as u8;
            out[0] = ((255 - y) * inv_k / 255) as u8;
        }
    }
}
