use crate::libs::group::{Group, GroupAccumulator, DEFAULT_CAPACITY};
use crate::libs::polish::PolishReader;
use crate::libs::report::{ReportMode, Reporter};
use crate::libs::select::{pick_best, Tolerance};
use log::{debug, info};
use std::io::{BufRead, Write};

/// A progress notice is logged for query ids that are multiples of this
pub const PROGRESS_INTERVAL: u32 = 1287;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickOptions {
    pub tolerance: Tolerance,
    pub mode: ReportMode,
    /// Initial number of polishes the group buffer holds
    pub capacity: usize,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            mode: ReportMode::default(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    /// Groups processed
    pub queries: usize,
    /// Polishes read
    pub polishes: usize,
    /// Winning polishes written (or marked, when validating)
    pub written: usize,
}

/// Read polishes grouped by query id from `reader` and report the best of each
/// group to `writer`.
pub fn pick_best_stream<R: BufRead, W: Write>(
    reader: R,
    writer: W,
    opt: &PickOptions,
) -> anyhow::Result<Summary> {
    let mut acc = GroupAccumulator::with_capacity(opt.capacity);
    let mut reporter = Reporter::new(writer, opt.mode);
    let mut summary = Summary::default();

    for polish in PolishReader::new(reader) {
        let polish = polish?;
        summary.polishes += 1;

        if let Some(group) = acc.observe(polish)? {
            process_group(&group, &opt.tolerance, &mut reporter)?;
            summary.queries += 1;
            acc.recycle(group);
        }
    }

    if let Some(group) = acc.flush() {
        process_group(&group, &opt.tolerance, &mut reporter)?;
        summary.queries += 1;
    }

    reporter.flush()?;
    summary.written = reporter.written();

    Ok(summary)
}

fn process_group<W: Write>(
    group: &Group,
    tol: &Tolerance,
    reporter: &mut Reporter<W>,
) -> std::io::Result<()> {
    if group.len() > 1 && group.query_id() % PROGRESS_INTERVAL == 0 {
        info!(
            "Picking Best for estID={} with {:>5} choices.",
            group.query_id(),
            group.len()
        );
    }

    if let Some(selection) = pick_best(group.records(), tol) {
        debug!(
            "estID={} picked ({}, {}, {}) by {:?}",
            group.query_id(),
            selection.identity,
            selection.matches,
            selection.exons,
            selection.branch
        );
        reporter.report(group.records(), &selection)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::polish::{Exon, Polish};

    fn polish(query_id: u32, target_id: u32, identity: u32, matches: u32, exons: usize) -> Polish {
        Polish {
            query_id,
            target_id,
            identity,
            matches,
            exons: vec![
                Exon {
                    q_from: 1,
                    q_to: 10,
                    t_from: 101,
                    t_to: 110,
                    matches: 10,
                    identity,
                    ..Default::default()
                };
                exons
            ],
            ..Default::default()
        }
    }

    fn to_text(polishes: &[Polish]) -> String {
        polishes.iter().map(|p| p.to_string()).collect()
    }

    fn run(input: &str, opt: &PickOptions) -> (String, Summary) {
        let mut out = vec![];
        let summary = pick_best_stream(input.as_bytes(), &mut out, opt).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn test_groups() {
        let polishes = vec![
            polish(1, 10, 99, 40, 2),
            polish(1, 11, 90, 80, 2),
            polish(2, 20, 95, 100, 3),
            polish(3, 30, 97, 50, 2),
            polish(3, 31, 97, 50, 2),
        ];
        let (out, summary) = run(&to_text(&polishes), &PickOptions::default());

        assert_eq!(
            summary,
            Summary {
                queries: 3,
                polishes: 5,
                written: 4,
            }
        );
        let expected = to_text(&[
            polishes[0].clone(),
            polishes[2].clone(),
            polishes[3].clone(),
            polishes[4].clone(),
        ]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_input() {
        let (out, summary) = run("", &PickOptions::default());
        assert!(out.is_empty());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_validate() {
        let polishes = vec![
            polish(1, 10, 99, 40, 2),
            polish(1, 11, 90, 80, 2),
            polish(2, 20, 95, 100, 3),
        ];
        let opt = PickOptions {
            mode: ReportMode::Validate,
            ..Default::default()
        };
        let (out, summary) = run(&to_text(&polishes), &opt);

        // the lone polish of query 2 is not reported
        assert_eq!(summary.written, 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "--------------------7 (Pctid Plus alpha > 0.8)");
        assert!(lines[1].ends_with(" *"));
        assert!(!lines[2].ends_with(" *"));
    }

    #[test]
    fn test_mrna_tolerance() {
        let polishes = vec![polish(4, 40, 98, 50, 2), polish(4, 41, 98, 38, 5)];
        let text = to_text(&polishes);

        let (out, _) = run(&text, &PickOptions::default());
        assert_eq!(out, polishes[0].to_string());

        let opt = PickOptions {
            tolerance: Tolerance::mrna(),
            ..Default::default()
        };
        let (out, _) = run(&text, &opt);
        assert_eq!(out, polishes[1].to_string());
    }

    #[test]
    fn test_more_polishes_than_capacity() {
        // all tied, every one of them wins
        let polishes: Vec<Polish> = (0..50).map(|t| polish(5, t, 90, 20, 1)).collect();
        let opt = PickOptions {
            capacity: 4,
            ..Default::default()
        };
        let (out, summary) = run(&to_text(&polishes), &opt);

        assert_eq!(summary.queries, 1);
        assert_eq!(summary.polishes, 50);
        assert_eq!(summary.written, 50);
        assert_eq!(out, to_text(&polishes));
    }

    #[test]
    fn test_parse_error() {
        let mut out = vec![];
        let res = pick_best_stream("sim4begin\nnot a header\nsim4end\n".as_bytes(), &mut out, &PickOptions::default());
        let err = res.unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }
}
