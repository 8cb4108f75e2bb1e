//! Command routing.
//!
//! Incoming text is matched against a fixed, ordered table of commands
//! (first match wins, keywords case-sensitive). Argument extraction is
//! total: malformed input yields the command's literal usage message and
//! never reaches the remote-calling handler body.

use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;

/// EVM-style address: 0x followed by hex digits.
static RE_ADDRESS: Lazy<Regex> = lazy_regex!(r"^0x[a-fA-F0-9]+$");
/// Chain keyword: a single alphanumeric word.
static RE_CHAIN: Lazy<Regex> = lazy_regex!(r"^\w+$");

const EXAMPLE_TOKEN: &str = "0x603c7f932ed1fc6575303d8fb018fdcbb0f39a95";
const EXAMPLE_WALLET: &str = "0x26fcbd3afebbe28d0a8684f790c48368d21665b5";

/// A parsed command with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/help`
    Help,
    /// `/time`
    Time,
    /// `/echo <text>`
    Echo {
        /// Text to echo back
        text: String,
    },
    /// `/token <token_address>`: token detail card
    TokenDetail {
        /// Token contract address
        token: String,
    },
    /// `/map <chain> <token_address>`: full analytics
    Analytics {
        /// Chain keyword (eth, bsc, ...)
        chain: String,
        /// Token contract address
        token: String,
    },
    /// `/score <chain> <token_address>`: decentralization score
    Score {
        /// Chain keyword
        chain: String,
        /// Token contract address
        token: String,
    },
    /// `/holders <chain> <token_address>`: top holders
    Holders {
        /// Chain keyword
        chain: String,
        /// Token contract address
        token: String,
    },
    /// `/screenshot <chain> <token_address>`: bubble map screenshot
    Screenshot {
        /// Chain keyword
        chain: String,
        /// Token contract address
        token: String,
    },
    /// `/chart <token_address>`: price/volume chart and trend analysis
    PriceChart {
        /// Token contract address
        token: String,
    },
    /// `/balances <wallet_address>`: wallet token balances
    WalletBalances {
        /// Wallet address
        wallet: String,
    },
    /// `/pnl <wallet_address>`: wallet profit and loss
    WalletPnl {
        /// Wallet address
        wallet: String,
    },
}

/// Routing verdict for one inbound text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A registered command with well-formed arguments.
    Command(Command),
    /// A registered keyword with missing/malformed arguments; carries the
    /// usage message to send. No remote calls are made.
    Invalid {
        /// Deterministic usage message with a worked example
        usage: String,
    },
    /// `/`-prefixed input matching no registered keyword.
    Unknown,
    /// Plain text, not command-like.
    PlainText,
}

type Extractor = fn(&str) -> Result<Command, String>;

/// One row of the command table: keyword plus total argument extractor.
struct CommandSpec {
    keyword: &'static str,
    extract: Extractor,
}

/// Registration-ordered command table; searched top to bottom, first
/// match wins.
static COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        keyword: "/start",
        extract: |_| Ok(Command::Start),
    },
    CommandSpec {
        keyword: "/help",
        extract: |_| Ok(Command::Help),
    },
    CommandSpec {
        keyword: "/time",
        extract: |_| Ok(Command::Time),
    },
    CommandSpec {
        keyword: "/echo",
        extract: |args| {
            if args.is_empty() {
                Err("Nothing to echo!".to_string())
            } else {
                Ok(Command::Echo {
                    text: args.to_string(),
                })
            }
        },
    },
    CommandSpec {
        keyword: "/token",
        extract: |args| {
            let token = extract_address(args, "/token", EXAMPLE_TOKEN)?;
            Ok(Command::TokenDetail { token })
        },
    },
    CommandSpec {
        keyword: "/map",
        extract: |args| {
            let (chain, token) = extract_chain_token(args, "/map")?;
            Ok(Command::Analytics { chain, token })
        },
    },
    CommandSpec {
        keyword: "/score",
        extract: |args| {
            let (chain, token) = extract_chain_token(args, "/score")?;
            Ok(Command::Score { chain, token })
        },
    },
    CommandSpec {
        keyword: "/holders",
        extract: |args| {
            let (chain, token) = extract_chain_token(args, "/holders")?;
            Ok(Command::Holders { chain, token })
        },
    },
    CommandSpec {
        keyword: "/screenshot",
        extract: |args| {
            let (chain, token) = extract_chain_token(args, "/screenshot")?;
            Ok(Command::Screenshot { chain, token })
        },
    },
    CommandSpec {
        keyword: "/chart",
        extract: |args| {
            let token = extract_address(args, "/chart", EXAMPLE_TOKEN)?;
            Ok(Command::PriceChart { token })
        },
    },
    CommandSpec {
        keyword: "/balances",
        extract: |args| {
            let wallet = extract_address(args, "/balances", EXAMPLE_WALLET)?;
            Ok(Command::WalletBalances { wallet })
        },
    },
    CommandSpec {
        keyword: "/pnl",
        extract: |args| {
            let wallet = extract_address(args, "/pnl", EXAMPLE_WALLET)?;
            Ok(Command::WalletPnl { wallet })
        },
    },
];

fn usage_chain_token(keyword: &str) -> String {
    format!("Please provide both chain and token address. Example: {keyword} bsc {EXAMPLE_TOKEN}")
}

fn usage_address(keyword: &str, example: &str) -> String {
    format!("Please provide an address. Example: {keyword} {example}")
}

/// `<chain> <token_address>`, space-delimited, chain lowercased.
fn extract_chain_token(args: &str, keyword: &str) -> Result<(String, String), String> {
    let mut parts = args.split_whitespace();
    let (Some(chain), Some(token)) = (parts.next(), parts.next()) else {
        return Err(usage_chain_token(keyword));
    };
    if !RE_CHAIN.is_match(chain) || !RE_ADDRESS.is_match(token) {
        return Err(usage_chain_token(keyword));
    }
    Ok((chain.to_lowercase(), token.to_string()))
}

/// A single `0x...` address argument.
fn extract_address(args: &str, keyword: &str, example: &str) -> Result<String, String> {
    let mut parts = args.split_whitespace();
    let Some(address) = parts.next() else {
        return Err(usage_address(keyword, example));
    };
    if !RE_ADDRESS.is_match(address) {
        return Err(usage_address(keyword, example));
    }
    Ok(address.to_string())
}

/// Classify one inbound text payload against the command table.
#[must_use]
pub fn route(text: &str) -> Route {
    let text = text.trim();
    if !text.starts_with('/') {
        return Route::PlainText;
    }

    let (keyword, args) = match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], text[pos..].trim_start()),
        None => (text, ""),
    };
    // Group-chat form: /map@SomeBot bsc 0x...
    let keyword = keyword.split('@').next().unwrap_or(keyword);

    for spec in COMMAND_TABLE {
        if spec.keyword == keyword {
            return match (spec.extract)(args) {
                Ok(command) => Route::Command(command),
                Err(usage) => Route::Invalid { usage },
            };
        }
    }
    Route::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(route("hello there"), Route::PlainText);
    }

    #[test]
    fn unknown_slash_input_is_rejected() {
        assert_eq!(route("/frobnicate 123"), Route::Unknown);
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(route("/MAP bsc 0xabc123"), Route::Unknown);
    }

    #[test]
    fn map_without_args_yields_literal_usage() {
        let Route::Invalid { usage } = route("/map") else {
            panic!("expected usage message");
        };
        assert_eq!(
            usage,
            "Please provide both chain and token address. \
             Example: /map bsc 0x603c7f932ed1fc6575303d8fb018fdcbb0f39a95"
        );
    }

    #[test]
    fn map_with_malformed_address_yields_usage() {
        assert!(matches!(route("/map bsc deadbeef"), Route::Invalid { .. }));
    }

    #[test]
    fn map_extracts_lowercased_chain_and_token() {
        assert_eq!(
            route("/map   BSC 0x603C7f932ed1fc6575303d8fb018fdcbb0f39a95"),
            Route::Command(Command::Analytics {
                chain: "bsc".to_string(),
                token: "0x603C7f932ed1fc6575303d8fb018fdcbb0f39a95".to_string(),
            })
        );
    }

    #[test]
    fn bot_suffix_is_stripped() {
        assert_eq!(route("/help@BubblemapBot"), Route::Command(Command::Help));
    }

    #[test]
    fn echo_requires_text() {
        assert_eq!(
            route("/echo"),
            Route::Invalid {
                usage: "Nothing to echo!".to_string()
            }
        );
        assert_eq!(
            route("/echo hi there"),
            Route::Command(Command::Echo {
                text: "hi there".to_string()
            })
        );
    }

    #[test]
    fn single_address_commands_extract() {
        assert!(matches!(
            route("/chart 0x603c7f932ed1fc6575303d8fb018fdcbb0f39a95"),
            Route::Command(Command::PriceChart { .. })
        ));
        assert!(matches!(
            route("/pnl 0x26fcbd3afebbe28d0a8684f790c48368d21665b5"),
            Route::Command(Command::WalletPnl { .. })
        ));
        assert!(matches!(route("/balances"), Route::Invalid { .. }));
    }
}
