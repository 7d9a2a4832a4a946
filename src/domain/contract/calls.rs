//! Contract calls and their calldata encoding.
//!
//! Calldata is built by hand: a 4-byte keccak selector followed by the standard ABI
//! head/tail layout. Only the argument types the civic contract uses are supported.

use crate::crypto::hashing::function_selector;
use crate::domain::types::CitizenId;

pub const REGISTERED_CITIZENS: &str = "registeredCitizens";
pub const REGISTER_CITIZEN: &str = "registerCitizen";
pub const VOTE: &str = "vote";
pub const CREATE_PROPOSAL: &str = "createProposal";
pub const REPORT_ISSUE: &str = "reportIssue";

const WORD: usize = 32;

/// A state-changing contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    RegisterCitizen {
        citizen: CitizenId,
    },
    Vote {
        proposal_id: u64,
        choice: bool,
        citizen: CitizenId,
    },
    CreateProposal {
        title: String,
        description: String,
        duration_seconds: u64,
    },
    ReportIssue {
        category: String,
        description: String,
        location: String,
        citizen: CitizenId,
    },
}

/// A single ABI-encodable argument.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Token<'a> {
    Uint(u64),
    Bool(bool),
    Bytes32(&'a CitizenId),
    Str(&'a str),
}

impl ContractCall {
    /// Contract method name, as declared in the ABI.
    pub fn method(&self) -> &'static str {
        match self {
            Self::RegisterCitizen { .. } => REGISTER_CITIZEN,
            Self::Vote { .. } => VOTE,
            Self::CreateProposal { .. } => CREATE_PROPOSAL,
            Self::ReportIssue { .. } => REPORT_ISSUE,
        }
    }

    /// Canonical signature used to derive the selector.
    pub fn signature(&self) -> &'static str {
        match self {
            Self::RegisterCitizen { .. } => "registerCitizen(bytes32)",
            Self::Vote { .. } => "vote(uint256,bool,bytes32)",
            Self::CreateProposal { .. } => "createProposal(string,string,uint256)",
            Self::ReportIssue { .. } => "reportIssue(string,string,string,bytes32)",
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let tokens = match self {
            Self::RegisterCitizen { citizen } => vec![Token::Bytes32(citizen)],
            Self::Vote {
                proposal_id,
                choice,
                citizen,
            } => vec![
                Token::Uint(*proposal_id),
                Token::Bool(*choice),
                Token::Bytes32(citizen),
            ],
            Self::CreateProposal {
                title,
                description,
                duration_seconds,
            } => vec![
                Token::Str(title),
                Token::Str(description),
                Token::Uint(*duration_seconds),
            ],
            Self::ReportIssue {
                category,
                description,
                location,
                citizen,
            } => vec![
                Token::Str(category),
                Token::Str(description),
                Token::Str(location),
                Token::Bytes32(citizen),
            ],
        };
        with_selector(self.signature(), &tokens)
    }
}

/// Calldata for the read-only `registeredCitizens(bytes32)` lookup.
pub fn encode_registered_citizens(citizen: &CitizenId) -> Vec<u8> {
    with_selector("registeredCitizens(bytes32)", &[Token::Bytes32(citizen)])
}

/// Decodes a single `bool` return word.
pub fn decode_bool(output: &[u8]) -> Option<bool> {
    let word = output.get(..WORD)?;
    if word[..WORD - 1].iter().any(|b| *b != 0) {
        return None;
    }
    match word[WORD - 1] {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

fn with_selector(signature: &str, tokens: &[Token<'_>]) -> Vec<u8> {
    let mut data = function_selector(signature).to_vec();
    data.extend(encode_tokens(tokens));
    data
}

fn encode_tokens(tokens: &[Token<'_>]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(v) => head.extend_from_slice(&uint_word(*v)),
            Token::Bool(b) => head.extend_from_slice(&uint_word(u64::from(*b))),
            Token::Bytes32(h) => head.extend_from_slice(h.as_bytes()),
            Token::Str(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
                tail.extend_from_slice(&uint_word(s.len() as u64));
                tail.extend_from_slice(s.as_bytes());
                let padding = (WORD - s.len() % WORD) % WORD;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
        }
    }

    head.extend(tail);
    head
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::H256;

    fn word(data: &[u8], index: usize) -> &[u8] {
        &data[4 + index * WORD..4 + (index + 1) * WORD]
    }

    #[test]
    fn register_citizen_is_selector_plus_identifier() {
        let citizen = H256::repeat_byte(0x11);
        let data = ContractCall::RegisterCitizen { citizen }.encode();
        assert_eq!(data.len(), 4 + WORD);
        assert_eq!(&data[..4], &function_selector("registerCitizen(bytes32)"));
        assert_eq!(word(&data, 0), citizen.as_bytes());
    }

    #[test]
    fn vote_encodes_static_arguments_in_place() {
        let citizen = H256::repeat_byte(0x22);
        let data = ContractCall::Vote {
            proposal_id: 5,
            choice: true,
            citizen,
        }
        .encode();
        assert_eq!(data.len(), 4 + 3 * WORD);
        assert_eq!(word(&data, 0), &uint_word(5));
        assert_eq!(word(&data, 1), &uint_word(1));
        assert_eq!(word(&data, 2), citizen.as_bytes());
    }

    #[test]
    fn create_proposal_places_strings_in_the_tail() {
        let data = ContractCall::CreateProposal {
            title: "a".into(),
            description: "b".into(),
            duration_seconds: 60,
        }
        .encode();
        // 3 head words + (length word + one padded data word) per string
        assert_eq!(data.len(), 4 + 3 * WORD + 4 * WORD);
        assert_eq!(word(&data, 0), &uint_word(0x60));
        assert_eq!(word(&data, 1), &uint_word(0xa0));
        assert_eq!(word(&data, 2), &uint_word(60));
        assert_eq!(word(&data, 3), &uint_word(1));
        assert_eq!(word(&data, 4)[0], b'a');
        assert!(word(&data, 4)[1..].iter().all(|b| *b == 0));
        assert_eq!(word(&data, 5), &uint_word(1));
        assert_eq!(word(&data, 6)[0], b'b');
    }

    #[test]
    fn report_issue_pads_multi_word_strings() {
        let long = "x".repeat(40);
        let citizen = H256::repeat_byte(0x33);
        let data = ContractCall::ReportIssue {
            category: "roads".into(),
            description: long.clone(),
            location: String::new(),
            citizen,
        }
        .encode();
        assert_eq!(word(&data, 0), &uint_word(0x80));
        // "roads": length + 1 word => next offset 0x80 + 0x40
        assert_eq!(word(&data, 1), &uint_word(0xc0));
        // 40 bytes: length + 2 words => next offset 0xc0 + 0x60
        assert_eq!(word(&data, 2), &uint_word(0x120));
        assert_eq!(word(&data, 3), citizen.as_bytes());
        // empty string is a bare zero length word
        assert_eq!(data.len(), 4 + 4 * WORD + 2 * WORD + 3 * WORD + WORD);
    }

    #[test]
    fn decodes_bool_words_strictly() {
        assert_eq!(decode_bool(&uint_word(1)), Some(true));
        assert_eq!(decode_bool(&uint_word(0)), Some(false));
        assert_eq!(decode_bool(&uint_word(2)), None);
        assert_eq!(decode_bool(&[0u8; 8]), None);
    }
}
