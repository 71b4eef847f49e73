use crate::libs::polish::Polish;
use crate::libs::select::Selection;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    /// Print the winning polishes in full
    #[default]
    Normal,
    /// Print every polish as a summary line, marking the winners
    Validate,
}

/// One summary line of a polish, ` *` appended for the best ones.
///
/// ```
/// use polishpick::libs::polish::Polish;
/// use polishpick::libs::report::write_summary;
///
/// let polish: Polish = "sim4begin\n\
///     12[1500-0-0] 5[1000-50000] <1450-0-97-forward-forward>\n\
///     1-500 (1001-1500) <490-0-98>\n\
///     sim4end\n"
///     .parse()
///     .unwrap();
/// let mut buf = vec![];
/// write_summary(&mut buf, &polish, true).unwrap();
/// assert_eq!(
///     String::from_utf8(buf).unwrap(),
///     "      12        5   97 1450 (     1/  1001    500/  1500  98) *\n"
/// );
/// ```
pub fn write_summary<W: Write>(w: &mut W, polish: &Polish, is_best: bool) -> io::Result<()> {
    write!(
        w,
        "{:>8} {:>8} {:>4} {:>4}",
        polish.query_id, polish.target_id, polish.identity, polish.matches
    )?;

    for exon in &polish.exons {
        write!(
            w,
            " ({:>6}/{:>6} {:>6}/{:>6} {:>3})",
            exon.q_from, exon.t_from, exon.q_to, exon.t_to, exon.identity
        )?;
    }

    if is_best {
        write!(w, " *")?;
    }

    writeln!(w)
}

/// Writes the outcome of each group.
pub struct Reporter<W: Write> {
    writer: W,
    mode: ReportMode,
    written: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(writer: W, mode: ReportMode) -> Self {
        Self {
            writer,
            mode,
            written: 0,
        }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Number of winning polishes reported so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn report(&mut self, polishes: &[Polish], selection: &Selection) -> io::Result<()> {
        match self.mode {
            ReportMode::Normal => {
                for polish in selection.winners(polishes) {
                    polish.write_to(&mut self.writer)?;
                    self.written += 1;
                }
            }
            ReportMode::Validate => {
                // A lone polish was never compared against anything
                let Some(branch) = selection.branch else {
                    return Ok(());
                };

                writeln!(
                    self.writer,
                    "--------------------{} ({})",
                    branch.tag(),
                    branch.label()
                )?;
                for polish in polishes {
                    let is_best = selection.is_winner(polish);
                    write_summary(&mut self.writer, polish, is_best)?;
                    if is_best {
                        self.written += 1;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::polish::Exon;
    use crate::libs::select::{pick_best, Branch, Tolerance};

    fn polish(target_id: u32, identity: u32, matches: u32, exons: usize) -> Polish {
        let exons = (0..exons as u32)
            .map(|i| Exon {
                q_from: i * 10 + 1,
                q_to: i * 10 + 10,
                t_from: 1000 + i * 100 + 1,
                t_to: 1000 + i * 100 + 10,
                matches: 10,
                identity,
                ..Default::default()
            })
            .collect();
        Polish {
            query_id: 3,
            target_id,
            identity,
            matches,
            exons,
            ..Default::default()
        }
    }

    fn run(polishes: &[Polish], mode: ReportMode) -> (String, usize) {
        let selection = pick_best(polishes, &Tolerance::default()).unwrap();
        let mut reporter = Reporter::new(vec![], mode);
        reporter.report(polishes, &selection).unwrap();
        let written = reporter.written();
        (String::from_utf8(reporter.into_inner()).unwrap(), written)
    }

    #[test]
    fn test_summary_line() {
        let mut buf = vec![];
        write_summary(&mut buf, &polish(7, 95, 20, 2), false).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "       3        7   95   20 (     1/  1001     10/  1010  95) (    11/  1101     20/  1110  95)\n"
        );
    }

    #[test]
    fn test_normal_mode() {
        let polishes = vec![polish(1, 99, 40, 2), polish(2, 90, 80, 2), polish(3, 99, 40, 2)];
        let (out, written) = run(&polishes, ReportMode::Normal);

        assert_eq!(written, 2);
        assert_eq!(out, format!("{}{}", polishes[0], polishes[2]));

        // within eps_i the longer polish wins
        let polishes = vec![polish(1, 99, 40, 2), polish(2, 97, 50, 2), polish(3, 99, 40, 2)];
        let (out, written) = run(&polishes, ReportMode::Normal);

        assert_eq!(written, 1);
        assert_eq!(out, polishes[1].to_string());
        assert!(out.contains("3[0-0-0] 2[0-0]"));
    }

    #[test]
    fn test_normal_mode_single() {
        let polishes = vec![polish(9, 50, 5, 1)];
        let (out, written) = run(&polishes, ReportMode::Normal);
        assert_eq!(written, 1);
        assert_eq!(out, polishes[0].to_string());
    }

    #[test]
    fn test_validate_mode() {
        let polishes = vec![polish(1, 99, 40, 2), polish(2, 90, 80, 2), polish(3, 99, 40, 2)];
        let (out, written) = run(&polishes, ReportMode::Validate);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(written, 2);
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            format!("--------------------7 ({})", Branch::PctidPlusAlpha.label())
        );
        assert!(lines[1].starts_with("       3        1   99   40 "));
        assert!(lines[1].ends_with(" *"));
        assert!(!lines[2].ends_with(" *"));
        assert!(lines[3].ends_with(" *"));
        assert!(!out.contains("sim4begin"));
    }

    #[test]
    fn test_validate_mode_single() {
        let polishes = vec![polish(9, 50, 5, 1)];
        let (out, written) = run(&polishes, ReportMode::Validate);
        assert_eq!(written, 0);
        assert!(out.is_empty());
    }
}
