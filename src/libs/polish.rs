use crate::libs::error::PolishError;
use std::fmt;
use std::io::{self, BufRead};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchOrientation {
    #[default]
    Forward,
    Complement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrandOrientation {
    Forward,
    Reverse,
    #[default]
    Unknown,
    Intractable,
    Aborted,
}

/// Orientation of the intron following an exon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntronOrientation {
    Forward,
    Reverse,
    Ambiguous,
    Gap,
    #[default]
    None,
}

impl MatchOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOrientation::Forward => "forward",
            MatchOrientation::Complement => "complement",
        }
    }
}

impl FromStr for MatchOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(MatchOrientation::Forward),
            "complement" => Ok(MatchOrientation::Complement),
            _ => Err(format!("Invalid match orientation: {}", s)),
        }
    }
}

impl StrandOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrandOrientation::Forward => "forward",
            StrandOrientation::Reverse => "reverse",
            StrandOrientation::Unknown => "unknown",
            StrandOrientation::Intractable => "intractable",
            StrandOrientation::Aborted => "aborted",
        }
    }
}

impl FromStr for StrandOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(StrandOrientation::Forward),
            "reverse" => Ok(StrandOrientation::Reverse),
            "unknown" => Ok(StrandOrientation::Unknown),
            "intractable" => Ok(StrandOrientation::Intractable),
            "aborted" => Ok(StrandOrientation::Aborted),
            _ => Err(format!("Invalid strand orientation: {}", s)),
        }
    }
}

impl IntronOrientation {
    /// Suffix of an exon line, including the leading space
    pub fn suffix(&self) -> &'static str {
        match self {
            IntronOrientation::Forward => " ->",
            IntronOrientation::Reverse => " <-",
            IntronOrientation::Ambiguous => " --",
            IntronOrientation::Gap => " ==",
            IntronOrientation::None => "",
        }
    }

    fn from_token(s: &str) -> Option<Self> {
        match s {
            "->" => Some(IntronOrientation::Forward),
            "<-" => Some(IntronOrientation::Reverse),
            "--" => Some(IntronOrientation::Ambiguous),
            "==" => Some(IntronOrientation::Gap),
            _ => None,
        }
    }
}

/// One exon of a polish. Coordinates are 1-based, inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exon {
    pub q_from: u32,
    pub q_to: u32,
    pub t_from: u32,
    pub t_to: u32,
    pub matches: u32,
    pub matches_n: u32,
    pub identity: u32,
    pub intron: IntronOrientation,
    pub q_align: Option<String>,
    pub t_align: Option<String>,
}

/// A single sim4 polish: one spliced alignment of a query (EST/mRNA) against a
/// region of a target (genomic) sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polish {
    pub query_id: u32,
    pub query_len: u32,
    pub poly_a: u32,
    pub poly_t: u32,
    pub target_id: u32,
    pub target_lo: u32,
    pub target_hi: u32,
    pub matches: u32,
    pub matches_n: u32,
    pub identity: u32,
    pub match_ori: MatchOrientation,
    pub strand_ori: StrandOrientation,
    pub comment: Option<String>,
    pub query_def: Option<String>,
    pub target_def: Option<String>,
    pub exons: Vec<Exon>,
}

impl Polish {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn num_exons(&self) -> usize {
        self.exons.len()
    }

    /// The (identity, matches, exons) triple the best-polish heuristic ranks on
    pub fn score_key(&self) -> (u32, u32, usize) {
        (self.identity, self.matches, self.num_exons())
    }

    /// Write the full sim4 polish block, `sim4begin` to `sim4end`.
    pub fn write_to<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "sim4begin")?;
        writeln!(
            w,
            "{}[{}-{}-{}] {}[{}-{}] <{}-{}-{}-{}-{}>",
            self.query_id,
            self.query_len,
            self.poly_a,
            self.poly_t,
            self.target_id,
            self.target_lo,
            self.target_hi,
            self.matches,
            self.matches_n,
            self.identity,
            self.match_ori.as_str(),
            self.strand_ori.as_str()
        )?;

        if let Some(comment) = &self.comment {
            writeln!(w, "comment={}", comment)?;
        }
        if let Some(def) = &self.query_def {
            writeln!(w, "edef={}", def)?;
        }
        if let Some(def) = &self.target_def {
            writeln!(w, "ddef={}", def)?;
        }

        for exon in &self.exons {
            writeln!(
                w,
                "{}-{} ({}-{}) <{}-{}-{}>{}",
                exon.q_from,
                exon.q_to,
                exon.t_from,
                exon.t_to,
                exon.matches,
                exon.matches_n,
                exon.identity,
                exon.intron.suffix()
            )?;
        }

        for exon in &self.exons {
            if let (Some(q), Some(t)) = (&exon.q_align, &exon.t_align) {
                writeln!(w, "{}", q)?;
                writeln!(w, "{}", t)?;
            }
        }

        writeln!(w, "sim4end")?;
        Ok(())
    }
}

impl fmt::Display for Polish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        write!(f, "{}", String::from_utf8_lossy(&buf))
    }
}

// "12[1500-0-0]" -> ("12", ["1500", "0", "0"])
fn split_bracket(token: &str) -> Option<(&str, Vec<&str>)> {
    let (head, rest) = token.split_once('[')?;
    let inner = rest.strip_suffix(']')?;
    Some((head, inner.split('-').collect()))
}

// "<490-0-98>" -> ["490", "0", "98"]
fn split_angle(token: &str) -> Option<Vec<&str>> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    Some(inner.split('-').collect())
}

fn parse_u32(s: &str, line: usize, what: &str) -> Result<u32, PolishError> {
    s.parse::<u32>()
        .map_err(|_| PolishError::parse(line, format!("Invalid {}: {}", what, s)))
}

fn parse_header(polish: &mut Polish, text: &str, line: usize) -> Result<(), PolishError> {
    let invalid = || PolishError::parse(line, format!("Invalid polish header: {}", text));

    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let (q_id, q_fields) = split_bracket(parts[0]).ok_or_else(invalid)?;
    let (t_id, t_fields) = split_bracket(parts[1]).ok_or_else(invalid)?;
    let scores = split_angle(parts[2]).ok_or_else(invalid)?;
    if q_fields.len() != 3 || t_fields.len() != 2 || scores.len() != 5 {
        return Err(invalid());
    }

    polish.query_id = parse_u32(q_id, line, "query id")?;
    polish.query_len = parse_u32(q_fields[0], line, "query length")?;
    polish.poly_a = parse_u32(q_fields[1], line, "polyA length")?;
    polish.poly_t = parse_u32(q_fields[2], line, "polyT length")?;
    polish.target_id = parse_u32(t_id, line, "target id")?;
    polish.target_lo = parse_u32(t_fields[0], line, "target start")?;
    polish.target_hi = parse_u32(t_fields[1], line, "target end")?;
    polish.matches = parse_u32(scores[0], line, "number of matches")?;
    polish.matches_n = parse_u32(scores[1], line, "number of N matches")?;
    polish.identity = parse_u32(scores[2], line, "percent identity")?;
    polish.match_ori = scores[3]
        .parse()
        .map_err(|e: String| PolishError::parse(line, e))?;
    polish.strand_ori = scores[4]
        .parse()
        .map_err(|e: String| PolishError::parse(line, e))?;

    Ok(())
}

fn parse_exon(text: &str, line: usize) -> Result<Exon, PolishError> {
    let invalid = || PolishError::parse(line, format!("Invalid exon: {}", text));

    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(invalid());
    }

    let (q_from, q_to) = parts[0].split_once('-').ok_or_else(invalid)?;
    let (t_from, t_to) = parts[1]
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .and_then(|s| s.split_once('-'))
        .ok_or_else(invalid)?;
    let scores = split_angle(parts[2]).ok_or_else(invalid)?;
    if scores.len() != 3 {
        return Err(invalid());
    }

    let intron = match parts.get(3) {
        Some(token) => IntronOrientation::from_token(token).ok_or_else(invalid)?,
        None => IntronOrientation::None,
    };

    Ok(Exon {
        q_from: parse_u32(q_from, line, "exon query start")?,
        q_to: parse_u32(q_to, line, "exon query end")?,
        t_from: parse_u32(t_from, line, "exon target start")?,
        t_to: parse_u32(t_to, line, "exon target end")?,
        matches: parse_u32(scores[0], line, "exon matches")?,
        matches_n: parse_u32(scores[1], line, "exon N matches")?,
        identity: parse_u32(scores[2], line, "exon percent identity")?,
        intron,
        q_align: None,
        t_align: None,
    })
}

/// Reads sim4 polishes one block at a time.
pub struct PolishReader<R> {
    reader: R,
    line_buf: String,
    line_no: usize,
}

impl<R: BufRead> PolishReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: inner,
            line_buf: String::new(),
            line_no: 0,
        }
    }

    fn read_line(&mut self) -> Result<bool, PolishError> {
        self.line_buf.clear();
        let n = self
            .reader
            .read_line(&mut self.line_buf)
            .map_err(|e| PolishError::parse(self.line_no + 1, e.to_string()))?;
        if n > 0 {
            self.line_no += 1;
        }
        Ok(n > 0)
    }

    fn current(&self) -> &str {
        self.line_buf.trim_end_matches(['\n', '\r'])
    }

    fn read_polish(&mut self) -> Result<Option<Polish>, PolishError> {
        // sim4begin, skipping blank lines between blocks
        loop {
            if !self.read_line()? {
                return Ok(None);
            }
            let line = self.current();
            if line.trim().is_empty() {
                continue;
            }
            if line != "sim4begin" {
                return Err(PolishError::parse(
                    self.line_no,
                    format!("Expected 'sim4begin', got '{}'", line),
                ));
            }
            break;
        }

        let mut polish = Polish::new();

        if !self.read_line()? {
            return Err(PolishError::parse(
                self.line_no,
                "Unexpected EOF after 'sim4begin'",
            ));
        }
        let header = self.current().to_string();
        parse_header(&mut polish, &header, self.line_no)?;

        let mut alignments: Vec<String> = Vec::new();
        loop {
            if !self.read_line()? {
                return Err(PolishError::parse(
                    self.line_no,
                    "Unexpected EOF before 'sim4end'",
                ));
            }
            let line = self.current().to_string();

            if line == "sim4end" {
                break;
            } else if let Some(text) = line.strip_prefix("comment=") {
                polish.comment = Some(text.to_string());
            } else if let Some(text) = line.strip_prefix("edef=") {
                polish.query_def = Some(text.to_string());
            } else if let Some(text) = line.strip_prefix("ddef=") {
                polish.target_def = Some(text.to_string());
            } else if line.starts_with(|c: char| c.is_ascii_digit()) {
                if !alignments.is_empty() {
                    return Err(PolishError::parse(
                        self.line_no,
                        "Exon found after alignment lines",
                    ));
                }
                polish.exons.push(parse_exon(&line, self.line_no)?);
            } else {
                alignments.push(line);
            }
        }

        if !alignments.is_empty() {
            if alignments.len() != 2 * polish.exons.len() {
                return Err(PolishError::parse(
                    self.line_no,
                    format!(
                        "Expected {} alignment lines for {} exons, got {}",
                        2 * polish.exons.len(),
                        polish.exons.len(),
                        alignments.len()
                    ),
                ));
            }
            let mut lines = alignments.into_iter();
            for exon in polish.exons.iter_mut() {
                exon.q_align = lines.next();
                exon.t_align = lines.next();
            }
        }

        Ok(Some(polish))
    }
}

impl<R: BufRead> Iterator for PolishReader<R> {
    type Item = Result<Polish, PolishError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_polish().transpose()
    }
}

impl FromStr for Polish {
    type Err = PolishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = PolishReader::new(s.as_bytes());
        match reader.next() {
            Some(result) => result,
            None => Err(PolishError::parse(0, "No polish found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_EXONS: &str = "\
sim4begin
12[1500-0-0] 5[1000-50000] <1450-0-97-forward-forward>
edef=>est12 some description
ddef=>chr5
1-500 (1001-1500) <490-0-98> ->
501-1500 (3001-4000) <960-0-96>
sim4end
";

    #[test]
    fn test_parse_polish() {
        let polish: Polish = TWO_EXONS.parse().unwrap();
        assert_eq!(polish.query_id, 12);
        assert_eq!(polish.query_len, 1500);
        assert_eq!(polish.target_id, 5);
        assert_eq!(polish.target_lo, 1000);
        assert_eq!(polish.target_hi, 50000);
        assert_eq!(polish.matches, 1450);
        assert_eq!(polish.identity, 97);
        assert_eq!(polish.match_ori, MatchOrientation::Forward);
        assert_eq!(polish.strand_ori, StrandOrientation::Forward);
        assert_eq!(polish.comment, None);
        assert_eq!(polish.query_def.as_deref(), Some(">est12 some description"));
        assert_eq!(polish.target_def.as_deref(), Some(">chr5"));

        assert_eq!(polish.num_exons(), 2);
        let exon = &polish.exons[0];
        assert_eq!((exon.q_from, exon.q_to), (1, 500));
        assert_eq!((exon.t_from, exon.t_to), (1001, 1500));
        assert_eq!(exon.matches, 490);
        assert_eq!(exon.identity, 98);
        assert_eq!(exon.intron, IntronOrientation::Forward);
        assert_eq!(polish.exons[1].intron, IntronOrientation::None);

        assert_eq!(polish.score_key(), (97, 1450, 2));
    }

    #[test]
    fn test_write_polish() {
        let polish: Polish = TWO_EXONS.parse().unwrap();
        assert_eq!(format!("{}", polish), TWO_EXONS);
    }

    #[test]
    fn test_alignment_lines() {
        let text = "\
sim4begin
3[8-0-0] 1[0-100] <7-0-87-complement-reverse>
comment=short one
1-4 (11-14) <4-0-100> <-
5-8 (21-24) <3-0-75>
ACGT
ACGT
ACGA
ACGG
sim4end
";
        let polish: Polish = text.parse().unwrap();
        assert_eq!(polish.match_ori, MatchOrientation::Complement);
        assert_eq!(polish.strand_ori, StrandOrientation::Reverse);
        assert_eq!(polish.comment.as_deref(), Some("short one"));
        assert_eq!(polish.exons[0].intron, IntronOrientation::Reverse);
        assert_eq!(polish.exons[0].q_align.as_deref(), Some("ACGT"));
        assert_eq!(polish.exons[1].q_align.as_deref(), Some("ACGA"));
        assert_eq!(polish.exons[1].t_align.as_deref(), Some("ACGG"));

        assert_eq!(format!("{}", polish), text);
    }

    #[test]
    fn test_reader_multiple() {
        let text = format!("{}\n\n{}", TWO_EXONS, TWO_EXONS.replace("12[", "13["));
        let reader = PolishReader::new(text.as_bytes());
        let ids: Vec<u32> = reader.map(|p| p.unwrap().query_id).collect();
        assert_eq!(ids, vec![12, 13]);
    }

    #[test]
    fn test_reader_empty() {
        let mut reader = PolishReader::new("\n\n".as_bytes());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_parse_invalid() {
        let res: Result<Polish, _> = "garbage\n".parse();
        assert_eq!(
            res.unwrap_err(),
            PolishError::parse(1, "Expected 'sim4begin', got 'garbage'")
        );

        let text = TWO_EXONS.replace("<1450-0-97-forward-forward>", "<1450-0-97-sideways-forward>");
        let res: Result<Polish, _> = text.parse();
        assert!(matches!(res, Err(PolishError::ParseError { line: 2, .. })));

        let text = TWO_EXONS.replace("501-1500 (3001-4000)", "501-1500 3001-4000");
        let res: Result<Polish, _> = text.parse();
        assert!(matches!(res, Err(PolishError::ParseError { line: 6, .. })));

        let text = TWO_EXONS.replace("sim4end\n", "");
        let res: Result<Polish, _> = text.parse();
        assert!(res.is_err());
    }
}
