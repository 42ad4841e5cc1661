//! Runtime result types.

/// Complete generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub request_id: String,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub total_time_ms: f32,
}

impl GenerationResult {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Real-time factor (< 1.0 means faster than real-time)
    pub fn rtf(&self) -> f32 {
        let duration = self.duration_secs();
        if duration > 0.0 {
            (self.total_time_ms / 1000.0) / duration
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtf_is_generation_time_over_audio_time() {
        let result = GenerationResult {
            request_id: "r1".to_string(),
            samples: vec![0.0; 24000],
            sample_rate: 24000,
            total_time_ms: 500.0,
        };
        assert!((result.duration_secs() - 1.0).abs() < 1e-6);
        assert!((result.rtf() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_result_has_zero_rtf() {
        let result = GenerationResult {
            request_id: "r2".to_string(),
            samples: Vec::new(),
            sample_rate: 24000,
            total_time_ms: 10.0,
        };
        assert_eq!(result.rtf(), 0.0);
    }
}
