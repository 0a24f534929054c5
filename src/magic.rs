//! The ordered rule table and the classification scan.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, trace};

use crate::error::{SniffResult, SnifferError};
use crate::parser;
use crate::rule::Rule;

/// Rule table bundled with the crate, covering common formats.
const BUILTIN_RULES: &str = include_str!("../data/magic.mime");

/// An immutable, ordered sequence of rules. Order is load-bearing: the
/// scan is first-match-wins in file order. A `RuleSet` holds no mutable
/// state, so one instance can classify any number of sources, including
/// concurrently as long as each call owns its own source.
#[derive(Clone, Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// The outcome of one classification scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchResult {
    Matches(String),
    NoMatch,
}

impl RuleSet {
    /// Parses rule-file text. Total over any input: lines that do not fit
    /// the grammar (comments, blanks, garbage) contribute no rules and
    /// raise no errors.
    pub fn parse(text: &str) -> RuleSet {
        let mut rules = Vec::new();

        for (line_idx, line) in text.lines().enumerate() {
            match parser::parse_line(line) {
                Some(rule) => rules.push(rule),
                None => trace!(line = line_idx + 1, "skipping non-rule line"),
            }
        }

        debug!(rules = rules.len(), "parsed rule set");
        RuleSet { rules }
    }

    /// Loads and parses a rule file. Fails with
    /// [`SnifferError::SourceNotFound`] when the file cannot be opened or
    /// read; the parse itself cannot fail.
    pub fn load<P: AsRef<Path>>(path: P) -> SniffResult<RuleSet> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|err| SnifferError::not_found(path, err))?;
        Ok(RuleSet::parse(&text))
    }

    /// The bundled default rule table.
    pub fn builtin() -> RuleSet {
        RuleSet::parse(BUILTIN_RULES)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Scans the rules in order against `source` and returns the first
    /// classification that matches.
    ///
    /// Each independent rule re-anchors the parent offset for the
    /// dependent rules after it, match or no match. A matching rule with a
    /// MIME type returns it at once; one with only a description returns
    /// that, trailing newlines stripped; one with neither keeps the scan
    /// going.
    pub fn classify<F: Read + Seek>(&self, source: &mut F) -> MatchResult {
        let mut parent_offset = 0u64;

        for rule in &self.rules {
            if !rule.matches(source, &mut parent_offset) {
                continue;
            }

            if let Some(mime) = &rule.mime_type {
                trace!(%mime, "rule matched");
                return MatchResult::Matches(mime.clone());
            }
            if let Some(description) = &rule.description {
                trace!(%description, "rule matched");
                return MatchResult::Matches(
                    description.trim_end_matches(['\r', '\n']).to_string(),
                );
            }
            // Matched, but there is nothing to report. The anchor update
            // from the offset-resolution step stands and the scan goes on.
            trace!(offset = rule.offset, "match without classification");
        }

        MatchResult::NoMatch
    }

    /// Classifies the file at `path`, substituting `default` when nothing
    /// matches. Only the open can fail.
    pub fn classify_path<P: AsRef<Path>>(
        &self,
        path: P,
        default: Option<&str>,
    ) -> SniffResult<Option<String>> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|err| SnifferError::not_found(path, err))?;

        Ok(match self.classify(&mut file) {
            MatchResult::Matches(classification) => Some(classification),
            MatchResult::NoMatch => default.map(str::to_owned),
        })
    }

    /// Whether the file at `path` classifies exactly as `expected`. Plain
    /// string equality, no normalization.
    pub fn is_type<P: AsRef<Path>>(&self, path: P, expected: &str) -> SniffResult<bool> {
        Ok(self.classify_path(path, None)?.as_deref() == Some(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchResult, RuleSet};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn matches(value: &str) -> MatchResult {
        MatchResult::Matches(value.to_string())
    }

    #[test]
    fn only_grammar_matching_lines_contribute_rules() {
        let text = "\
# comment at the top

0 beshort 0xffd8 image/jpeg
not a rule at all
>30 string mimetype
   # indented comment
0 bogus data still/counts
";
        assert_eq!(3, RuleSet::parse(text).rules().len());
    }

    #[test]
    fn empty_input_parses_to_an_empty_set() {
        assert_eq!(0, RuleSet::parse("").rules().len());
        assert_eq!(0, RuleSet::parse("\n\n").rules().len());
    }

    #[test]
    fn jpeg_signature_matches_big_endian_short() {
        let rules = RuleSet::parse("0 beshort 0xffd8 image/jpeg");

        let mut jpeg = Cursor::new(vec![0xff, 0xd8, 0xff, 0xe0]);
        assert_eq!(matches("image/jpeg"), rules.classify(&mut jpeg));

        let mut not_jpeg = Cursor::new(vec![0xff, 0xd7, 0xff, 0xe0]);
        assert_eq!(MatchResult::NoMatch, rules.classify(&mut not_jpeg));
    }

    #[test]
    fn first_match_in_file_order_wins() {
        let rules = RuleSet::parse(
            "0 string PK generic archive\n\
             0 string PK\\003\\004 application/zip",
        );
        let mut source = Cursor::new(b"PK\x03\x04".to_vec());
        assert_eq!(matches("generic archive"), rules.classify(&mut source));
    }

    #[test]
    fn mime_type_wins_over_description_on_the_same_rule() {
        let rules = RuleSet::parse("0 string OggS application/ogg Ogg bitstream");
        let mut source = Cursor::new(b"OggS".to_vec());
        assert_eq!(matches("application/ogg"), rules.classify(&mut source));
    }

    #[test]
    fn dependent_rules_chain_from_the_last_independent_offset() {
        let rules = RuleSet::parse(
            "0 string RIFF\n\
             >8 string WAVE audio/x-wav",
        );
        let mut wav = Cursor::new(b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec());
        assert_eq!(matches("audio/x-wav"), rules.classify(&mut wav));

        let mut other_riff = Cursor::new(b"RIFF\x24\x00\x00\x00AVI LIST".to_vec());
        assert_eq!(MatchResult::NoMatch, rules.classify(&mut other_riff));
    }

    #[test]
    fn a_second_independent_rule_resets_the_anchor() {
        // The dependent rule reads at 6 + 2, not 0 + 2.
        let rules = RuleSet::parse(
            "0 string AA\n\
             6 string BB\n\
             >2 string CC found/it",
        );
        let mut source = Cursor::new(b"AAxxxxBBCCxx".to_vec());
        assert_eq!(matches("found/it"), rules.classify(&mut source));
    }

    #[test]
    fn classification_less_matches_keep_scanning() {
        let rules = RuleSet::parse(
            "0 string AB\n\
             0 string ABCD text/x-abcd",
        );
        let mut source = Cursor::new(b"ABCDEF".to_vec());
        assert_eq!(matches("text/x-abcd"), rules.classify(&mut source));
    }

    #[test]
    fn idml_chain_requires_the_inner_mimetype_marker() {
        let rules = RuleSet::parse(
            "0 string PK\\003\\004\n\
             >30 string mimetype\n\
             >38 string application/vnd.adobe.indesign-idml-package application/vnd.adobe.indesign-idml-package\n\
             0 string PK\\003\\004 application/zip",
        );

        let mut idml = Vec::new();
        idml.extend_from_slice(b"PK\x03\x04");
        idml.resize(30, 0);
        idml.extend_from_slice(b"mimetype");
        idml.extend_from_slice(b"application/vnd.adobe.indesign-idml-package");
        assert_eq!(
            matches("application/vnd.adobe.indesign-idml-package"),
            rules.classify(&mut Cursor::new(idml)),
        );

        // A ZIP without the inner marker falls through to the generic line.
        let mut zip = Vec::new();
        zip.extend_from_slice(b"PK\x03\x04");
        zip.resize(64, 0);
        assert_eq!(
            matches("application/zip"),
            rules.classify(&mut Cursor::new(zip)),
        );
    }

    #[test]
    fn descriptions_lose_trailing_newlines() {
        let rules = RuleSet {
            rules: vec![crate::rule::Rule {
                dependent: false,
                offset: 0,
                match_type: crate::rule::MatchType::String,
                match_data: "MZ".to_string(),
                mime_type: None,
                description: Some("MS-DOS executable\n".to_string()),
            }],
        };
        let mut source = Cursor::new(b"MZ".to_vec());
        assert_eq!(matches("MS-DOS executable"), rules.classify(&mut source));
    }

    #[test]
    fn an_empty_rule_set_never_matches() {
        let rules = RuleSet::parse("# nothing here");
        let mut source = Cursor::new(b"anything".to_vec());
        assert_eq!(MatchResult::NoMatch, rules.classify(&mut source));
    }

    #[test]
    fn builtin_rules_recognize_common_signatures() {
        let rules = RuleSet::builtin();
        assert!(!rules.rules().is_empty());

        let mut png = Cursor::new(b"\x89PNG\r\n\x1a\nrest-of-file".to_vec());
        assert_eq!(matches("image/png"), rules.classify(&mut png));

        let mut jpeg = Cursor::new(vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]);
        assert_eq!(matches("image/jpeg"), rules.classify(&mut jpeg));

        let mut pdf = Cursor::new(b"%PDF-1.7\n".to_vec());
        assert_eq!(matches("application/pdf"), rules.classify(&mut pdf));

        let mut garbage = Cursor::new(b"\x00\x01\x02\x03nothing".to_vec());
        assert_eq!(MatchResult::NoMatch, rules.classify(&mut garbage));
    }
}
