//! Resource profiles: the tier table, size-token parsing, and per-field
//! overrides.
//!
//! A profile is resolved once per invocation (tier first, then explicit
//! overrides) and is immutable afterwards.

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Limits applied to the current process before it is replaced by the
/// target program. `memory` and `data` are byte counts, `files` is a
/// descriptor count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceProfile {
    pub memory: u64,
    pub data: u64,
    pub files: u64,
}

impl ResourceProfile {
    /// Patch individual fields from explicit command-line overrides.
    pub fn with_overrides(
        mut self,
        memory: Option<u64>,
        data: Option<u64>,
        files: Option<u64>,
    ) -> Self {
        if let Some(memory) = memory {
            self.memory = memory;
        }
        if let Some(data) = data {
            self.data = data;
        }
        if let Some(files) = files {
            self.files = files;
        }
        self
    }
}

/// Predefined limit tiers selectable with a single flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Large,
    Medium,
    Small,
    Starving,
}

impl Tier {
    pub fn profile(self) -> ResourceProfile {
        match self {
            Tier::Large => ResourceProfile {
                memory: GIB,
                data: GIB,
                files: 512,
            },
            Tier::Medium => ResourceProfile {
                memory: 512 * MIB,
                data: 512 * MIB,
                files: 256,
            },
            Tier::Small => ResourceProfile {
                memory: 128 * MIB,
                data: 128 * MIB,
                files: 64,
            },
            Tier::Starving => ResourceProfile {
                memory: 16 * MIB,
                data: 16 * MIB,
                files: 16,
            },
        }
    }
}

/// Parse a size token: decimal digits followed by an optional
/// case-insensitive unit suffix (`k`/`kb`, `m`/`mb`, `g`/`gb`).
///
/// No suffix means raw bytes. An unrecognized suffix also falls through to
/// raw bytes; only a token without leading digits is rejected. The
/// multiplication saturates at `u64::MAX`.
pub fn parse_size(token: &str) -> Result<u64, String> {
    let digits_end = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    if digits_end == 0 {
        return Err(format!("invalid size '{token}': expected leading digits"));
    }
    let count: u64 = token[..digits_end]
        .parse()
        .map_err(|_| format!("invalid size '{token}': value too large"))?;
    let multiplier = match token[digits_end..].to_ascii_lowercase().as_str() {
        "k" | "kb" => KIB,
        "m" | "mb" => MIB,
        "g" | "gb" => GIB,
        _ => 1,
    };
    Ok(count.saturating_mul(multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_without_suffix_is_raw_bytes() {
        assert_eq!(parse_size("0"), Ok(0));
        assert_eq!(parse_size("4096"), Ok(4096));
    }

    #[test]
    fn size_unit_multipliers() {
        assert_eq!(parse_size("5k"), Ok(5 * 1024));
        assert_eq!(parse_size("5kb"), Ok(5 * 1024));
        assert_eq!(parse_size("3m"), Ok(3 * 1024 * 1024));
        assert_eq!(parse_size("3mb"), Ok(3 * 1024 * 1024));
        assert_eq!(parse_size("2g"), Ok(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_size("2gb"), Ok(2 * 1024 * 1024 * 1024));
    }

    #[test]
    fn size_unit_is_case_insensitive() {
        assert_eq!(parse_size("5M"), parse_size("5m"));
        assert_eq!(parse_size("1Gb"), parse_size("1gb"));
        assert_eq!(parse_size("7KB"), parse_size("7k"));
    }

    #[test]
    fn unknown_suffix_falls_through_to_raw_bytes() {
        // Historical behavior: unmatched suffixes are ignored, not rejected.
        assert_eq!(parse_size("123x"), Ok(123));
        assert_eq!(parse_size("9qqq"), Ok(9));
    }

    #[test]
    fn size_without_leading_digits_is_rejected() {
        assert!(parse_size("").is_err());
        assert!(parse_size("m").is_err());
        assert!(parse_size("-5m").is_err());
        assert!(parse_size("x123").is_err());
    }

    #[test]
    fn huge_sizes_saturate() {
        assert_eq!(parse_size(&format!("{}g", u64::MAX)), Ok(u64::MAX));
    }

    #[test]
    fn tier_table() {
        let large = Tier::Large.profile();
        assert_eq!(large.memory, 1024 * 1024 * 1024);
        assert_eq!(large.data, 1024 * 1024 * 1024);
        assert_eq!(large.files, 512);

        let medium = Tier::Medium.profile();
        assert_eq!(medium.memory, 512 * 1024 * 1024);
        assert_eq!(medium.data, 512 * 1024 * 1024);
        assert_eq!(medium.files, 256);

        let small = Tier::Small.profile();
        assert_eq!(small.memory, 128 * 1024 * 1024);
        assert_eq!(small.files, 64);

        let starving = Tier::Starving.profile();
        assert_eq!(starving.memory, 16 * 1024 * 1024);
        assert_eq!(starving.data, 16 * 1024 * 1024);
        assert_eq!(starving.files, 16);
    }

    #[test]
    fn overrides_patch_single_fields() {
        let p = Tier::Medium.profile().with_overrides(Some(5 * 1024), None, None);
        assert_eq!(p.memory, 5 * 1024);
        assert_eq!(p.data, 512 * 1024 * 1024);
        assert_eq!(p.files, 256);

        let p = Tier::Large.profile().with_overrides(None, Some(1), Some(2));
        assert_eq!(p.memory, 1024 * 1024 * 1024);
        assert_eq!(p.data, 1);
        assert_eq!(p.files, 2);
    }
}
