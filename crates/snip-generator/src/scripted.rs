use crate::Generator;
use snip_core::ShortCode;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A generator that replays a fixed list of codes, cycling at the end.
///
/// Useful for forcing collisions: a script of `["AAAAAA", "AAAAAA", "BBBBBB"]`
/// hands the same candidate out twice before moving on.
#[derive(Debug)]
pub struct ScriptedGenerator {
    codes: Vec<ShortCode>,
    cursor: AtomicUsize,
}

impl ScriptedGenerator {
    /// # Panics
    ///
    /// Panics if `codes` is empty.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes: Vec<ShortCode> = codes.into_iter().map(ShortCode::new_unchecked).collect();
        assert!(!codes.is_empty(), "scripted generator needs at least one code");
        Self {
            codes,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of codes handed out so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl Generator for ScriptedGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.codes[index % self.codes.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_in_order_then_cycles() {
        let generator = ScriptedGenerator::new(["AAAAAA", "BBBBBB"]);

        assert_eq!(generator.generate().as_str(), "AAAAAA");
        assert_eq!(generator.generate().as_str(), "BBBBBB");
        assert_eq!(generator.generate().as_str(), "AAAAAA");
        assert_eq!(generator.calls(), 3);
    }

    #[test]
    #[should_panic(expected = "at least one code")]
    fn empty_script_is_rejected() {
        let _ = ScriptedGenerator::new(Vec::<&str>::new());
    }
}
