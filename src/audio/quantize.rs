//! Fixed-point conversion from the capture float format to the wire format.

/// Quantize one floating-point sample in [-1.0, 1.0] to signed 16-bit.
///
/// Round-to-nearest, saturating: out-of-range input clamps to the i16
/// range instead of wrapping.
pub fn quantize_sample(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Quantize a capture buffer. An empty buffer yields an empty result.
pub fn quantize(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| quantize_sample(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_example_vector() {
        assert_eq!(
            quantize(&[0.0, 0.5, -1.0, 1.0]),
            vec![0, 16384, -32768, 32767]
        );
    }

    #[test]
    fn stays_within_one_step_of_reference_over_full_range() {
        // For every in-range sample the output must be within one step of
        // round(s * 32767) and inside the 16-bit range.
        for i in -1000..=1000 {
            let s = i as f32 / 1000.0;
            let q = quantize_sample(s) as f64;
            let reference = (s as f64 * 32767.0).round();
            assert!(
                (q - reference).abs() <= 1.0,
                "s={}: quantized {} vs reference {}",
                s,
                q,
                reference
            );
            assert!((-32768.0..=32767.0).contains(&q));
        }
    }

    #[test]
    fn out_of_range_input_saturates() {
        assert_eq!(quantize_sample(2.0), 32767);
        assert_eq!(quantize_sample(-2.0), -32768);
        assert_eq!(quantize_sample(f32::INFINITY), 32767);
        assert_eq!(quantize_sample(f32::NEG_INFINITY), -32768);
    }

    #[test]
    fn empty_buffer_yields_empty_frame() {
        assert!(quantize(&[]).is_empty());
    }
}
