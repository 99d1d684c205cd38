use playport_core::AssetKind;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn type_factor(kind: AssetKind) -> f64 {
    match kind {
        AssetKind::Texture => 1.5,
        AssetKind::Material => 1.2,
        AssetKind::Model => 1.0,
        _ => 0.8,
    }
}

/// Download priority: frequent and small first. Binaries backing a container
/// count double since several render assets wait on them.
pub fn priority(usage_count: usize, kind: AssetKind, size_bytes: u64, backs_container: bool) -> f64 {
    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    let base = (usage_count as f64 * 10.0 * type_factor(kind)) / (size_mb + 1.0);
    if backs_container { base * 2.0 } else { base }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smaller_file_wins_at_equal_usage() {
        let small = priority(3, AssetKind::Texture, 512 * 1024, false);
        let large = priority(3, AssetKind::Texture, 8 * 1024 * 1024, false);
        assert!(small > large);
    }

    #[test]
    fn factors_apply() {
        assert_eq!(priority(1, AssetKind::Model, 0, false), 10.0);
        assert_eq!(priority(1, AssetKind::Texture, 0, false), 15.0);
        assert_eq!(priority(2, AssetKind::Container, 1024 * 1024, true), 16.0);
        assert_eq!(priority(0, AssetKind::Texture, 0, false), 0.0);
    }
}
