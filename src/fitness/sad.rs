/// Sum of Absolute Differences (SAD) / Manhattan distance on the RGB channels.
/// alpha is skipped: rendered pixels are always opaque, so only color counts.
use rayon::prelude::*;

// bytes per Rayon unit; multiple of 4 so chunks never split a pixel
const MIN_CHUNK_BYTES: usize = 64 * 1024;

/// SAD over interleaved RGBA buffers of equal length, alpha excluded
#[inline]
pub fn sad_rgb(target_rgba: &[u8], current_rgba: &[u8]) -> u64 {
    profiling::scope!("sad_rgb");
    debug_assert_eq!(target_rgba.len(), current_rgba.len());
    debug_assert_eq!(target_rgba.len() % 4, 0);

    if target_rgba.len() <= MIN_CHUNK_BYTES {
        return sad_rgb_scalar(target_rgba, current_rgba);
    }

    target_rgba
        .par_chunks(MIN_CHUNK_BYTES)
        .zip(current_rgba.par_chunks(MIN_CHUNK_BYTES))
        .map(|(t_chunk, c_chunk)| sad_rgb_scalar(t_chunk, c_chunk))
        .sum()
}

#[inline]
fn sad_rgb_scalar(target: &[u8], current: &[u8]) -> u64 {
    target
        .chunks_exact(4)
        .zip(current.chunks_exact(4))
        .map(|(t, c)| {
            let r_diff = t[0].abs_diff(c[0]) as u64;
            let g_diff = t[1].abs_diff(c[1]) as u64;
            let b_diff = t[2].abs_diff(c[2]) as u64;
            r_diff + g_diff + b_diff
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_slot_ignored() {
        let a = [10, 20, 30, 0, 0, 0, 0, 255];
        let b = [10, 20, 30, 255, 0, 0, 0, 0];
        assert_eq!(sad_rgb(&a, &b), 0);
    }

    #[test]
    fn test_absolute_differences_summed() {
        let a = [0, 255, 100, 7];
        let b = [255, 0, 110, 9];
        assert_eq!(sad_rgb(&a, &b), 255 + 255 + 10);
    }

    #[test]
    fn test_parallel_path_matches_scalar() {
        let len = MIN_CHUNK_BYTES * 3 + 4 * 37;
        let a: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
        let b: Vec<u8> = (0..len).map(|i| (i * 13 % 241) as u8).collect();
        assert_eq!(sad_rgb(&a, &b), sad_rgb_scalar(&a, &b));
    }
}
