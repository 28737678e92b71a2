mod character_reference;
mod token;
#[allow(clippy::module_inception)]
mod tokenizer;

pub use character_reference::decode_character_reference;
pub use token::{Attribute, PositionedToken, Token};
pub use tokenizer::{HTMLTokenizer, TokenizerState};
