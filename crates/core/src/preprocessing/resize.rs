/// Resample interleaved 8-bit pixels to `target_w` x `target_h` with bilinear
/// interpolation.
///
/// Pixel centres are aligned (`src = (dst + 0.5) * scale - 0.5`), and samples
/// falling outside the source clamp to the nearest edge pixel. Aspect ratio is
/// not preserved.
pub fn resize_bilinear(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    target_w: usize,
    target_h: usize,
) -> Vec<u8> {
    if width == target_w && height == target_h {
        return data.to_vec();
    }

    let mut out = vec![0u8; target_w * target_h * channels];
    let scale_x = width as f32 / target_w as f32;
    let scale_y = height as f32 / target_h as f32;

    let columns: Vec<(usize, usize, f32)> = (0..target_w)
        .map(|x| source_taps(x, scale_x, width))
        .collect();

    for y in 0..target_h {
        let (y0, y1, fy) = source_taps(y, scale_y, height);
        for (x, &(x0, x1, fx)) in columns.iter().enumerate() {
            for c in 0..channels {
                let v00 = data[(y0 * width + x0) * channels + c] as f32;
                let v10 = data[(y0 * width + x1) * channels + c] as f32;
                let v01 = data[(y1 * width + x0) * channels + c] as f32;
                let v11 = data[(y1 * width + x1) * channels + c] as f32;

                let val = v00 * (1.0 - fx) * (1.0 - fy)
                    + v10 * fx * (1.0 - fy)
                    + v01 * (1.0 - fx) * fy
                    + v11 * fx * fy;
                out[(y * target_w + x) * channels + c] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

/// Left/right source indices and the interpolation weight of the right one.
fn source_taps(dst: usize, scale: f32, len: usize) -> (usize, usize, f32) {
    let src = (dst as f32 + 0.5) * scale - 0.5;
    if src <= 0.0 {
        return (0, 0, 0.0);
    }
    let i0 = src.floor() as usize;
    if i0 >= len - 1 {
        return (len - 1, len - 1, 0.0);
    }
    (i0, i0 + 1, src - i0 as f32)
}
