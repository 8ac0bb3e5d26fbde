//! Assigning worked intervals to schedule entries.
//!
//! Assignment is greedy by overlap. When an entry claims a stretch of work,
//! whatever lies outside the entry's span is split off and stays available
//! to neighbouring entries, so one interval can cover back-to-back shifts.

use chrono::NaiveDateTime;

use super::intervals::WorkInterval;

/// What an entry was matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntryMatch {
    /// When work on this entry began.
    pub actual_start: NaiveDateTime,
    /// When work on this entry ended, if known.
    pub actual_end: Option<NaiveDateTime>,
    /// True while the underlying interval is still open for the day.
    pub open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    start: NaiveDateTime,
    end: NaiveDateTime,
    known_end: Option<NaiveDateTime>,
    open: bool,
    split_from: Option<(usize, Side)>,
    claimed: bool,
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    piece: Piece,
    clipped_left: bool,
    clipped_right: bool,
}

fn overlap_seconds(piece: &Piece, span: (NaiveDateTime, NaiveDateTime)) -> i64 {
    let start = piece.start.max(span.0);
    let end = piece.end.min(span.1);
    (end - start).num_seconds().max(0)
}

/// Matches each span to at most one stretch of work.
///
/// `spans` must be ordered by start; ties in overlap go to the earlier span,
/// then the earlier piece. `day_end` marks where intervals stop counting as
/// closed for the day being reconciled.
pub(crate) fn match_entries(
    spans: &[(NaiveDateTime, NaiveDateTime)],
    intervals: &[WorkInterval],
    day_end: NaiveDateTime,
    now: NaiveDateTime,
) -> Vec<Option<EntryMatch>> {
    let mut pieces: Vec<Piece> = intervals
        .iter()
        .map(|interval| Piece {
            start: interval.start,
            end: interval.effective_end(now),
            known_end: interval.end,
            open: interval.end.is_none_or(|end| end > day_end),
            split_from: None,
            claimed: false,
        })
        .collect();
    let mut claims: Vec<Option<Claim>> = vec![None; spans.len()];

    loop {
        let mut best: Option<(i64, usize, usize)> = None;
        for (entry, span) in spans.iter().enumerate() {
            if claims[entry].is_some() {
                continue;
            }
            for (index, piece) in pieces.iter().enumerate() {
                if piece.claimed {
                    continue;
                }
                let overlap = overlap_seconds(piece, *span);
                if overlap == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_overlap, best_entry, best_index)) => {
                        overlap > best_overlap
                            || (overlap == best_overlap
                                && entry == best_entry
                                && piece.start < pieces[best_index].start)
                    }
                };
                if better {
                    best = Some((overlap, entry, index));
                }
            }
        }

        let Some((_, entry, index)) = best else {
            break;
        };
        let (span_start, span_end) = spans[entry];
        let piece = pieces[index];
        pieces[index].claimed = true;

        if let Some((owner, side)) = piece.split_from {
            if let Some(claim) = claims[owner].as_mut() {
                match side {
                    Side::Left => claim.clipped_left = true,
                    Side::Right => claim.clipped_right = true,
                }
            }
        }

        if piece.start < span_start {
            pieces.push(Piece {
                start: piece.start,
                end: span_start,
                known_end: Some(span_start),
                open: false,
                split_from: Some((entry, Side::Left)),
                claimed: false,
            });
        }
        if piece.end > span_end {
            pieces.push(Piece {
                start: span_end,
                end: piece.end,
                known_end: piece.known_end,
                open: piece.open,
                split_from: Some((entry, Side::Right)),
                claimed: false,
            });
        }

        claims[entry] = Some(Claim {
            piece,
            clipped_left: false,
            clipped_right: false,
        });
    }

    claims
        .into_iter()
        .zip(spans)
        .map(|(claim, (span_start, span_end))| {
            claim.map(|claim| EntryMatch {
                actual_start: if claim.clipped_left {
                    *span_start
                } else {
                    claim.piece.start
                },
                actual_end: if claim.clipped_right {
                    Some(*span_end)
                } else {
                    claim.piece.known_end
                },
                open: !claim.clipped_right && claim.piece.open,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn t(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn day_end() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn interval(start: NaiveDateTime, end: Option<NaiveDateTime>) -> WorkInterval {
        WorkInterval {
            start,
            end,
            clock_in_id: Uuid::new_v4(),
            clock_out_id: end.map(|_| Uuid::new_v4()),
        }
    }

    #[test]
    fn test_single_entry_single_interval() {
        let matches = match_entries(
            &[(t(9, 0), t(17, 0))],
            &[interval(t(9, 12), Some(t(17, 5)))],
            day_end(),
            t(18, 0),
        );

        assert_eq!(
            matches,
            vec![Some(EntryMatch {
                actual_start: t(9, 12),
                actual_end: Some(t(17, 5)),
                open: false,
            })]
        );
    }

    #[test]
    fn test_no_overlap_is_unmatched() {
        let matches = match_entries(
            &[(t(9, 0), t(13, 0))],
            &[interval(t(14, 0), Some(t(15, 0)))],
            day_end(),
            t(18, 0),
        );
        assert_eq!(matches, vec![None]);
    }

    #[test]
    fn test_back_to_back_entries_share_one_interval() {
        let matches = match_entries(
            &[(t(9, 0), t(13, 0)), (t(13, 0), t(17, 0))],
            &[interval(t(9, 0), Some(t(17, 0)))],
            day_end(),
            t(18, 0),
        );

        let first = matches[0].unwrap();
        let second = matches[1].unwrap();
        assert_eq!(first.actual_start, t(9, 0));
        assert_eq!(first.actual_end, Some(t(13, 0)));
        assert_eq!(second.actual_start, t(13, 0));
        assert_eq!(second.actual_end, Some(t(17, 0)));
    }

    #[test]
    fn test_each_entry_takes_its_own_interval() {
        let matches = match_entries(
            &[(t(9, 0), t(13, 0)), (t(13, 30), t(17, 30))],
            &[
                interval(t(8, 58), Some(t(13, 2))),
                interval(t(13, 29), Some(t(17, 40))),
            ],
            day_end(),
            t(18, 0),
        );

        assert_eq!(matches[0].unwrap().actual_start, t(8, 58));
        assert_eq!(matches[0].unwrap().actual_end, Some(t(13, 2)));
        assert_eq!(matches[1].unwrap().actual_start, t(13, 29));
        assert_eq!(matches[1].unwrap().actual_end, Some(t(17, 40)));
    }

    #[test]
    fn test_open_interval_stays_open() {
        let matches = match_entries(
            &[(t(9, 0), t(17, 0))],
            &[interval(t(9, 12), None)],
            day_end(),
            t(10, 0),
        );

        let only = matches[0].unwrap();
        assert!(only.open);
        assert_eq!(only.actual_end, None);
    }

    #[test]
    fn test_clock_out_after_midnight_counts_as_open() {
        let next_day = day_end() + chrono::Duration::hours(2);
        let matches = match_entries(
            &[(t(18, 0), day_end())],
            &[interval(t(18, 0), Some(next_day))],
            day_end(),
            next_day,
        );

        let only = matches[0].unwrap();
        assert!(only.open);
        assert_eq!(only.actual_end, Some(next_day));
    }
}
