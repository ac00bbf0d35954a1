//! Object identifiers.

use std::fmt;
use std::str::FromStr;

use crate::error::CopyError;

/// A dotted object identifier such as `1.3.6.1.2.1.1.5.0`.
///
/// Parsing accepts an optional leading dot. Display never emits one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn new(arcs: impl Into<Vec<u32>>) -> Self {
        Self(arcs.into())
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a new identifier with `arc` appended.
    pub fn child(&self, arc: u32) -> Self {
        let mut arcs = Vec::with_capacity(self.0.len() + 1);
        arcs.extend_from_slice(&self.0);
        arcs.push(arc);
        Self(arcs)
    }

    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Last arc, i.e. the row index for a table column instance.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }
}

impl FromStr for Oid {
    type Err = CopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(CopyError::InvalidArgument("empty object identifier".into()));
        }
        trimmed
            .split('.')
            .map(|arc| {
                arc.parse::<u32>().map_err(|_| {
                    CopyError::InvalidArgument(format!("bad object identifier {s:?}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Oid)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
        }
        Ok(())
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self(arcs.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_leading_dot() {
        let a: Oid = ".1.3.6.1.2.1.1.5.0".parse().unwrap();
        let b: Oid = "1.3.6.1.2.1.1.5.0".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1.3.6.1.2.1.1.5.0");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Oid>().is_err());
        assert!("1.3.x.4".parse::<Oid>().is_err());
        assert!("1..3".parse::<Oid>().is_err());
    }

    #[test]
    fn child_and_prefix() {
        let base: Oid = "1.3.6.1.4.1.9.9.96.1.1.1.1".parse().unwrap();
        let status = base.child(10).child(451);
        assert!(status.starts_with(&base));
        assert_eq!(status.last(), Some(451));
        assert_eq!(status.len(), base.len() + 2);
    }
}
