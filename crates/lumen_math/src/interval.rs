/// A closed scalar range, used for the valid parameter range of a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns true if x is within the interval [min, max] (inclusive).
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Everything in front of a ray origin: `[0, f32::MAX]`.
    pub const FORWARD: Interval = Interval {
        min: 0.0,
        max: f32::MAX,
    };
}

impl Default for Interval {
    fn default() -> Self {
        Self::FORWARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_contains() {
        let interval = Interval::new(0.0, 10.0);

        // Inclusive bounds
        assert!(interval.contains(0.0));
        assert!(interval.contains(10.0));
        assert!(interval.contains(5.0));

        // Outside bounds
        assert!(!interval.contains(-0.1));
        assert!(!interval.contains(10.1));
    }

    #[test]
    fn test_forward_is_default() {
        let forward = Interval::default();

        assert!(forward.contains(0.0));
        assert!(forward.contains(1e30));
        assert!(!forward.contains(-1e-6));
        assert_eq!(forward, Interval::FORWARD);
    }
}
