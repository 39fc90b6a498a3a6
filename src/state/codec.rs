use crate::state::roster::Roster;
use lovecast_api::{AnswerRecord, CommittedPair};

const PAIR_SEPARATOR: char = ':';
const PAIR_DISPLAY_JOINER: &str = " ♥ ";

/// An answer in its structured form. `Raw` keeps values this codec does not
/// understand so they survive a round trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedAnswer {
    Pair(CommittedPair),
    Target(u32),
    Binary(bool),
    Raw(String),
}

/// Answers a single-select input can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarAnswer {
    Target(u32),
    Binary(bool),
}

impl From<ScalarAnswer> for EncodedAnswer {
    fn from(answer: ScalarAnswer) -> Self {
        match answer {
            ScalarAnswer::Target(id) => EncodedAnswer::Target(id),
            ScalarAnswer::Binary(value) => EncodedAnswer::Binary(value),
        }
    }
}

/// Encoding scheme revision. New item categories get a new variant; older
/// history stays decodable through the variant it was written with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CodecVersion {
    /// `"<a>:<b>"` for pairs, decimal ids for targets, `"yes"`/`"no"`.
    #[default]
    V1,
}

impl CodecVersion {
    pub const CURRENT: CodecVersion = CodecVersion::V1;

    pub fn encode(self, answer: &EncodedAnswer) -> String {
        match self {
            CodecVersion::V1 => match answer {
                EncodedAnswer::Pair(p) => format!("{}{PAIR_SEPARATOR}{}", p.side_a_id, p.side_b_id),
                EncodedAnswer::Target(id) => id.to_string(),
                EncodedAnswer::Binary(true) => "yes".to_owned(),
                EncodedAnswer::Binary(false) => "no".to_owned(),
                EncodedAnswer::Raw(raw) => raw.clone(),
            },
        }
    }

    /// Never fails: anything unrecognised comes back as `Raw`. Only
    /// canonical encodings are recognised, so `encode(parse(raw)) == raw`
    /// for every input.
    pub fn parse(self, raw: &str) -> EncodedAnswer {
        match self {
            CodecVersion::V1 => {
                if let Some((a, b)) = raw.split_once(PAIR_SEPARATOR) {
                    return match (canonical_id(a), canonical_id(b)) {
                        (Some(a), Some(b)) => EncodedAnswer::Pair(CommittedPair::new(a, b)),
                        _ => EncodedAnswer::Raw(raw.to_owned()),
                    };
                }
                match raw {
                    "yes" => EncodedAnswer::Binary(true),
                    "no" => EncodedAnswer::Binary(false),
                    _ => canonical_id(raw)
                        .map(EncodedAnswer::Target)
                        .unwrap_or_else(|| EncodedAnswer::Raw(raw.to_owned())),
                }
            }
        }
    }

    /// Build the outbound record. Pairs carry their side B id as the target.
    pub fn record(self, prediction_item_id: u32, answer: &EncodedAnswer) -> AnswerRecord {
        let target_participant_id = match answer {
            EncodedAnswer::Pair(p) => Some(p.side_b_id),
            _ => None,
        };
        AnswerRecord {
            prediction_item_id,
            selected_value: self.encode(answer),
            target_participant_id,
        }
    }
}

/// Decimal id exactly as `encode` writes it: no padding, sign or zeros.
fn canonical_id(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|id| id.to_string() == raw)
}

/// Human-readable form of an encoded value. Unresolvable ids and unknown
/// values degrade to the raw string.
pub fn decode_label(raw: &str, roster: &Roster) -> String {
    match CodecVersion::CURRENT.parse(raw) {
        EncodedAnswer::Pair(p) => {
            match (roster.name_of(p.side_a_id), roster.name_of(p.side_b_id)) {
                (Some(a), Some(b)) => format!("{a}{PAIR_DISPLAY_JOINER}{b}"),
                _ => raw.to_owned(),
            }
        }
        EncodedAnswer::Target(id) => roster
            .name_of(id)
            .map(str::to_owned)
            .unwrap_or_else(|| raw.to_owned()),
        EncodedAnswer::Binary(_) | EncodedAnswer::Raw(_) => raw.to_owned(),
    }
}
