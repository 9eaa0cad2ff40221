//! Revision set notation: `1000-1005,1008` <-> `[1000, ..., 1005, 1008]`.

use crate::errors::RevisionSpecError;

/// A Subversion revision number.
pub type Revnum = u64;

/// Runs shorter than this are written out as individual revisions.
const MIN_RANGE_LEN: usize = 3;

/// Expand a comma-separated revision spec into revision numbers.
///
/// Tokens are either a single revision or an inclusive `A-B` range. Token
/// order is preserved and duplicates are kept; callers intersect the result
/// with the real history.
pub fn parse(spec: &str) -> Result<Vec<Revnum>, RevisionSpecError> {
    if spec.trim().is_empty() {
        return Err(RevisionSpecError::Empty);
    }

    let mut expanded = Vec::new();
    for raw in spec.split(',') {
        let token = raw.trim();
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_bound(start, token)?;
                let end = parse_bound(end, token)?;
                if start > end {
                    return Err(RevisionSpecError::ReversedRange { start, end });
                }
                expanded.extend(start..=end);
            }
            None => {
                let rev = token
                    .parse::<Revnum>()
                    .map_err(|_| RevisionSpecError::InvalidToken {
                        token: token.to_string(),
                    })?;
                expanded.push(rev);
            }
        }
    }
    Ok(expanded)
}

fn parse_bound(bound: &str, token: &str) -> Result<Revnum, RevisionSpecError> {
    bound
        .trim()
        .parse::<Revnum>()
        .map_err(|_| RevisionSpecError::InvalidBound {
            token: token.to_string(),
        })
}

/// Compact ascending revisions back into range notation.
///
/// Consecutive runs of at least three revisions become `start-end`; anything
/// shorter is listed individually.
pub fn compact(ids: &[Revnum]) -> String {
    let mut parts = Vec::new();
    let mut i = 0;
    while i < ids.len() {
        let mut j = i;
        while j + 1 < ids.len() && ids[j].checked_add(1) == Some(ids[j + 1]) {
            j += 1;
        }
        if j + 1 - i >= MIN_RANGE_LEN {
            parts.push(format!("{}-{}", ids[i], ids[j]));
        } else {
            parts.extend(ids[i..=j].iter().map(|r| r.to_string()));
        }
        i = j + 1;
    }
    parts.join(",")
}

/// Short label for a list of revisions: `r1003-1005` when ascending,
/// `r1000,r999` otherwise.
pub fn label(ids: &[Revnum]) -> String {
    if ids.windows(2).all(|w| w[0] < w[1]) {
        format!("r{}", compact(ids))
    } else {
        ids.iter()
            .map(|r| format!("r{r}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worked_example() -> Vec<Revnum> {
        vec![
            1000, 1001, 1002, 1003, 1004, 1005, 1008, 1010, 1011, 1012, 1015, 1020,
        ]
    }

    #[test]
    fn test_parse_revisions() {
        assert_eq!(
            parse("1000-1005,1008,1010-1012,1015,1020").unwrap(),
            worked_example()
        );
    }

    #[test]
    fn test_compact_revisions() {
        assert_eq!(
            compact(&worked_example()),
            "1000-1005,1008,1010-1012,1015,1020"
        );
    }

    #[test]
    fn test_compact_short_runs_stay_unranged() {
        assert_eq!(compact(&[1000, 1001]), "1000,1001");
        assert_eq!(compact(&[7, 8, 10]), "7,8,10");
        assert_eq!(compact(&[42]), "42");
        assert_eq!(compact(&[]), "");
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        assert_eq!(parse("5,1-3,2").unwrap(), vec![5, 1, 2, 3, 2]);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(parse(" 10 - 12 , 15 ").unwrap(), vec![10, 11, 12, 15]);
    }

    #[test]
    fn test_parse_single_element_range() {
        assert_eq!(parse("7-7").unwrap(), vec![7]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse(""), Err(RevisionSpecError::Empty));
        assert_eq!(
            parse("1000,abc"),
            Err(RevisionSpecError::InvalidToken {
                token: "abc".into()
            })
        );
        assert_eq!(
            parse("1000,,1001"),
            Err(RevisionSpecError::InvalidToken { token: "".into() })
        );
        assert_eq!(
            parse("1000-x"),
            Err(RevisionSpecError::InvalidBound {
                token: "1000-x".into()
            })
        );
        assert_eq!(
            parse("-5"),
            Err(RevisionSpecError::InvalidBound { token: "-5".into() })
        );
        assert_eq!(
            parse("1-2-3"),
            Err(RevisionSpecError::InvalidBound {
                token: "1-2-3".into()
            })
        );
    }

    #[test]
    fn test_parse_rejects_reversed_range() {
        assert_eq!(
            parse("1005-1000"),
            Err(RevisionSpecError::ReversedRange {
                start: 1005,
                end: 1000
            })
        );
    }

    #[test]
    fn test_label() {
        assert_eq!(label(&[1000]), "r1000");
        assert_eq!(label(&[1003, 1004, 1005]), "r1003-1005");
        assert_eq!(label(&[1000, 999]), "r1000,r999");
    }

    #[test]
    fn test_parse_inverts_compact() {
        let samples: Vec<Vec<Revnum>> = vec![
            vec![],
            vec![1],
            vec![1, 2],
            vec![1, 2, 3],
            vec![0, 2, 4, 5, 6, 7, 9, 10],
            vec![3, 4, 5, 100, 101, 200, u64::MAX - 1, u64::MAX],
            worked_example(),
        ];
        for ids in samples {
            let text = compact(&ids);
            if ids.is_empty() {
                assert!(text.is_empty());
                continue;
            }
            assert_eq!(parse(&text).unwrap(), ids, "round trip of {text}");
        }
    }
}
