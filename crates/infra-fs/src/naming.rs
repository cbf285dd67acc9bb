// Element and intermediate directory naming

use crate::constants::{DIR_NAME_LEN, ELEMENT_NAME_LEN};

/// Intermediate directory for a timestamp, rounded down to the granularity
pub fn dir_name(now_secs: i64, granularity: u32) -> String {
    let granularity = i64::from(granularity);
    let bucket = if granularity > 1 {
        now_secs - now_secs.rem_euclid(granularity)
    } else {
        now_secs
    };
    format!("{:08x}", bucket)
}

/// Element name: seconds, microseconds and the random hex digit
pub fn element_name(now_micros: i64, rndhex: u8) -> String {
    let secs = now_micros.div_euclid(1_000_000);
    let micros = now_micros.rem_euclid(1_000_000);
    format!("{:08x}{:05x}{:01x}", secs, micros, rndhex & 0xf)
}

fn is_lower_hex(name: &str, len: usize) -> bool {
    name.len() == len
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

pub fn is_dir_name(name: &str) -> bool {
    is_lower_hex(name, DIR_NAME_LEN)
}

pub fn is_element_name(name: &str) -> bool {
    is_lower_hex(name, ELEMENT_NAME_LEN)
}

/// Element name carried by a suffixed file (`<element><suffix>`)
pub fn strip_element_suffix<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    name.strip_suffix(suffix).filter(|base| is_element_name(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{LOCKED_SUFFIX, TEMPORARY_SUFFIX};

    #[test]
    fn test_dir_name_rounds_to_granularity() {
        assert_eq!(dir_name(1_700_000_019, 60), format!("{:08x}", 1_699_999_980));
        assert_eq!(dir_name(125, 60), "00000078");
    }

    #[test]
    fn test_dir_name_without_rounding() {
        assert_eq!(dir_name(125, 1), "0000007d");
        assert_eq!(dir_name(125, 0), "0000007d");
    }

    #[test]
    fn test_element_name_layout() {
        let name = element_name(0x6553_f100 * 1_000_000 + 0x1e240, 0xa);
        assert_eq!(name, "6553f1001e240a");
        assert!(is_element_name(&name));
    }

    #[test]
    fn test_name_checks() {
        assert!(is_dir_name("6553f100"));
        assert!(!is_dir_name("6553F100"));
        assert!(!is_dir_name("6553f10"));
        assert!(!is_element_name("6553f1001e240a.tmp"));
        assert!(!is_element_name("lost+found"));
    }

    #[test]
    fn test_strip_suffix() {
        assert_eq!(
            strip_element_suffix("6553f1001e240a.lck", LOCKED_SUFFIX),
            Some("6553f1001e240a")
        );
        assert_eq!(strip_element_suffix("6553f1001e240a.lck", TEMPORARY_SUFFIX), None);
        assert_eq!(strip_element_suffix("junk.tmp", TEMPORARY_SUFFIX), None);
    }
}
