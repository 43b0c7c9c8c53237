use crate::frontend::instruction::Instruction;

const FORK_KEYWORD: &str = "FORK";

/// How the fork instruction is spelled in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForkSyntax {
    /// The word `FORK`.
    #[default]
    Keyword,
    /// A lone `f`.
    Letter,
    /// Either spelling.
    Both,
}

impl ForkSyntax {
    fn keyword(self) -> bool {
        matches!(self, ForkSyntax::Keyword | ForkSyntax::Both)
    }

    fn letter(self) -> bool {
        matches!(self, ForkSyntax::Letter | ForkSyntax::Both)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    pub fork_syntax: ForkSyntax,
}

/// An instruction together with the byte offset it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub instruction: Instruction,
    pub offset: usize,
}

/// Filtered program text: instructions in source order plus, for each one,
/// its byte offset in the raw source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    pub instructions: Vec<Instruction>,
    pub offsets: Vec<usize>,
}

impl Filtered {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn located(&self) -> impl Iterator<Item = Located> + '_ {
        self.instructions
            .iter()
            .zip(&self.offsets)
            .map(|(&instruction, &offset)| Located {
                instruction,
                offset,
            })
    }
}

/// Reduces raw source to the instruction alphabet. Anything else is comment
/// text and is dropped without complaint.
pub struct Loader<'a> {
    source: &'a str,
    pos: usize,
    config: LoaderConfig,
}

impl<'a> Loader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_config(source, LoaderConfig::default())
    }

    pub fn with_config(source: &'a str, config: LoaderConfig) -> Self {
        Loader {
            source,
            pos: 0,
            config,
        }
    }

    fn current(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_keyword(&self) -> bool {
        self.config.fork_syntax.keyword() && self.source[self.pos..].starts_with(FORK_KEYWORD)
    }

    fn next_instruction(&mut self) -> Option<Located> {
        loop {
            let offset = self.pos;

            if self.at_keyword() {
                self.pos += FORK_KEYWORD.len();
                return Some(Located {
                    instruction: Instruction::Fork,
                    offset,
                });
            }

            let ch = self.advance()?;
            let instruction = match Instruction::from_char(ch) {
                Some(i) => i,
                None if ch == 'f' && self.config.fork_syntax.letter() => Instruction::Fork,
                None => continue,
            };
            return Some(Located {
                instruction,
                offset,
            });
        }
    }

    pub fn filter(&mut self) -> Filtered {
        let mut filtered = Filtered::default();
        while let Some(located) = self.next_instruction() {
            filtered.instructions.push(located.instruction);
            filtered.offsets.push(located.offset);
        }
        filtered
    }
}

/// Convenience: filter `source` with the default keyword syntax.
pub fn filter(source: &str) -> Filtered {
    Loader::new(source).filter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Instruction::*;

    fn instructions(source: &str, syntax: ForkSyntax) -> Vec<Instruction> {
        Loader::with_config(
            source,
            LoaderConfig {
                fork_syntax: syntax,
            },
        )
        .filter()
        .instructions
    }

    #[test]
    fn test_base_alphabet() {
        let f = filter("><+-.,[]");
        assert_eq!(
            f.instructions,
            vec![Right, Left, Inc, Dec, Output, Input, LoopOpen, LoopClose]
        );
        assert_eq!(f.offsets, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_comments_dropped() {
        let f = filter("add one: + then print it .\n");
        assert_eq!(f.instructions, vec![Inc, Output]);
        assert_eq!(f.offsets, vec![9, 25]);
    }

    #[test]
    fn test_keyword_fork() {
        assert_eq!(
            instructions(",FORK,", ForkSyntax::Keyword),
            vec![Input, Fork, Input]
        );
        let f = filter("x FORK");
        assert_eq!(f.offsets, vec![2]);
    }

    #[test]
    fn test_partial_keyword_is_comment() {
        assert!(instructions("FOR FOK ORK", ForkSyntax::Keyword).is_empty());
    }

    #[test]
    fn test_letter_fork() {
        assert_eq!(instructions(",f,", ForkSyntax::Letter), vec![Input, Fork, Input]);
        // the keyword is plain comment text in the letter dialect
        assert!(instructions("FORK", ForkSyntax::Letter).is_empty());
        // and the letter is comment text in the keyword dialect
        assert!(instructions("f", ForkSyntax::Keyword).is_empty());
    }

    #[test]
    fn test_both_fork_syntaxes() {
        assert_eq!(instructions("fFORKf", ForkSyntax::Both), vec![Fork, Fork, Fork]);
    }

    #[test]
    fn test_multibyte_offsets() {
        let f = filter("é+ü-");
        assert_eq!(f.instructions, vec![Inc, Dec]);
        assert_eq!(f.offsets, vec![2, 5]);
    }

    #[test]
    fn test_located_iter() {
        let f = filter(" [ ] ");
        let located: Vec<_> = f.located().collect();
        assert_eq!(
            located,
            vec![
                Located {
                    instruction: LoopOpen,
                    offset: 1
                },
                Located {
                    instruction: LoopClose,
                    offset: 3
                },
            ]
        );
    }
}
