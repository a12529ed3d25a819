/*!
Searching with a compiled pattern.

A [`Regex`] owns an immutable [`Nfa`](crate::nfa::Nfa) and decides whether
an input string is accepted by it. Matching is *anchored*: a pattern
matches only when it consumes the entire input, so there is no notion of a
match position and the verdict is a plain boolean.

The search itself is the classical parallel-state simulation of a Thompson
NFA. A set of active states is advanced by one input byte per step, with
epsilon closure folded into the moment a state is entered. Every step costs
at most one visit per NFA state, so a whole search runs in `O(m * n)` time
for `m` states and `n` input bytes, with no risk of the exponential blowup
that backtracking engines hit on patterns like `(a|ab)*c`.

The working buffers for a search live in a [`Cache`], created once per
regex (and per thread) and reused by every call:

```
use rematch::matcher::Regex;

let re = Regex::new("h(e|a)*llo*")?;
let mut cache = re.create_cache();
assert!(re.is_match(&mut cache, "haeeeallooo"));
assert!(!re.is_match(&mut cache, "world"));
# Ok::<(), rematch::nfa::BuildError>(())
```
*/

use std::{mem::size_of, sync::Arc};

use bon::bon;

use crate::{
    nfa::{BuildError, Nfa, State, StateId},
    syntax,
};

/// A compiled regular expression for anchored matching.
///
/// A `Regex` is cheap to clone: the compiled NFA sits behind an `Arc` and
/// is shared by all clones. It is immutable after compilation, so clones
/// and references may be used freely from multiple threads; the mutable
/// working state of a search lives in a per-thread [`Cache`].
///
/// # Example
///
/// ```
/// use rematch::matcher::Regex;
///
/// let re = Regex::new("(a|b)*c")?;
/// let mut cache = re.create_cache();
/// assert!(re.is_match(&mut cache, "abbac"));
/// assert!(re.is_match(&mut cache, "ac"));
/// // Anchored: a match must span the whole input.
/// assert!(re.is_match(&mut cache, "abbacx") == false);
/// assert!(re.is_match(&mut cache, "xabbac") == false);
/// # Ok::<(), rematch::nfa::BuildError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Regex {
    nfa: Arc<Nfa>,
}

#[bon]
impl Regex {
    /// Compile the given pattern using the default configuration.
    pub fn new(pattern: &str) -> Result<Regex, BuildError> {
        Regex::builder().build(pattern)
    }

    /// Return a builder for configuring the compilation of a `Regex`.
    ///
    /// # Example
    ///
    /// ```
    /// use rematch::{matcher::Regex, nfa::ErrorKind};
    ///
    /// let re = Regex::builder().nest_limit(2).build("((a))")?;
    /// let mut cache = re.create_cache();
    /// assert!(re.is_match(&mut cache, "a"));
    ///
    /// let err = Regex::builder().nest_limit(2).build("(((a)))").unwrap_err();
    /// assert_eq!(err.kind(), ErrorKind::ExceededNestLimit);
    /// # Ok::<(), rematch::nfa::BuildError>(())
    /// ```
    #[builder(builder_type = Builder, finish_fn(name = build))]
    pub fn builder(
        #[builder(finish_fn)] pattern: &str,
        /// Cap on the heap memory the compiled NFA's state arena may use,
        /// in bytes. Compilation fails with
        /// [`ErrorKind::ExceededSizeLimit`](crate::nfa::ErrorKind::ExceededSizeLimit)
        /// once the arena would grow past it. Unlimited by default.
        nfa_size_limit: Option<usize>,
        /// Cap on group nesting depth, which bounds the parser's recursion.
        #[builder(default = syntax::DEFAULT_NEST_LIMIT)]
        nest_limit: u32,
    ) -> Result<Regex, BuildError> {
        let nfa = syntax::Parser::new(pattern, nest_limit, nfa_size_limit).parse()?;
        Ok(Regex { nfa: Arc::new(nfa) })
    }
}

impl Regex {
    /// Returns true if and only if this regex matches the entire haystack.
    ///
    /// The cache is reset at the start of every call, so a cache can be
    /// shared by any number of consecutive searches and repeated calls with
    /// the same haystack always agree.
    ///
    /// Matching never fails and never allocates; the worst case is
    /// `O(states * haystack)` time.
    ///
    /// # Panics
    ///
    /// This panics when the given cache was created for a regex with a
    /// different number of states. Use [`Cache::reset`] to migrate a cache
    /// to another regex.
    pub fn is_match(&self, cache: &mut Cache, haystack: &str) -> bool {
        let nfa = &*self.nfa;
        assert_eq!(
            cache.last_active.len(),
            nfa.states().len(),
            "cache was not created for this Regex",
        );

        cache.clist.clear();
        cache.nlist.clear();
        cache.last_active.fill(usize::MAX);
        let Cache { clist, nlist, last_active } = cache;

        enter(nfa, last_active, clist, 0, Some(nfa.start()));
        for (i, &byte) in haystack.as_bytes().iter().enumerate() {
            // Steps are numbered from 1 so that step 0 above and the
            // usize::MAX sentinel stay distinct from each other.
            let step = i + 1;
            nlist.clear();
            for &id in clist.iter() {
                if let State::Range { lo, hi, out } = *nfa.state(id) {
                    if lo <= byte && byte <= hi {
                        enter(nfa, last_active, nlist, step, out);
                    }
                }
            }
            std::mem::swap(clist, nlist);
        }
        clist.iter().any(|&id| matches!(nfa.state(id), State::Match))
    }

    /// Create a new cache for this regex, sized to its state arena.
    pub fn create_cache(&self) -> Cache {
        Cache::new(self)
    }

    /// The pattern this regex was compiled from.
    pub fn pattern(&self) -> &str {
        self.nfa.pattern()
    }

    /// How many bytes of the pattern the parser consumed; see
    /// [`Nfa::parsed_len`](crate::nfa::Nfa::parsed_len).
    pub fn parsed_len(&self) -> usize {
        self.nfa.parsed_len()
    }

    /// The compiled NFA backing this regex.
    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }
}

/// Enter a state into an active list, expanding epsilon transitions on the
/// way. `last_active` remembers the step at which each state was last
/// entered, so re-entering within one step is a no-op and a step never
/// visits a state twice.
fn enter(
    nfa: &Nfa,
    last_active: &mut [usize],
    list: &mut Vec<StateId>,
    step: usize,
    id: Option<StateId>,
) {
    let Some(id) = id else { return };
    if last_active[id as usize] == step {
        return;
    }
    last_active[id as usize] = step;
    match *nfa.state(id) {
        State::Split { out1, out2 } => {
            enter(nfa, last_active, list, step, out1);
            enter(nfa, last_active, list, step, out2);
        }
        _ => list.push(id),
    }
}

/// Mutable scratch space for a search: the "current" and "next" active
/// state lists and the per-state step stamps used for deduplication.
///
/// Creating a cache allocates buffers proportional to the regex's state
/// count; [`Regex::is_match`] then runs entirely inside them. A cache is
/// single-owner mutable state. To search with one regex from many threads,
/// give each thread its own cache.
pub struct Cache {
    clist: Vec<StateId>,
    nlist: Vec<StateId>,
    last_active: Vec<usize>,
}

impl Cache {
    /// Create a new cache for the given regex.
    pub fn new(re: &Regex) -> Cache {
        let states = re.nfa.states().len();
        Cache {
            clist: Vec::with_capacity(states),
            nlist: Vec::with_capacity(states),
            last_active: vec![usize::MAX; states],
        }
    }

    /// Reset this cache for use with the given regex, which may be a
    /// different one than it was created for. Existing buffers are reused
    /// where they are large enough.
    pub fn reset(&mut self, re: &Regex) {
        let states = re.nfa.states().len();
        self.clist.clear();
        self.nlist.clear();
        self.clist.reserve(states);
        self.nlist.reserve(states);
        self.last_active.clear();
        self.last_active.resize(states, usize::MAX);
    }

    /// Returns the heap memory usage of this cache in bytes.
    pub fn memory_usage(&self) -> usize {
        (self.clist.capacity() + self.nlist.capacity()) * size_of::<StateId>()
            + self.last_active.capacity() * size_of::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::ErrorKind;

    fn matches(pattern: &str, haystack: &str) -> bool {
        let re = Regex::new(pattern).unwrap();
        let mut cache = re.create_cache();
        re.is_match(&mut cache, haystack)
    }

    #[test]
    fn kitchen_sink() {
        assert!(matches("h(e|a)*llo*", "haeeeallooo"));
        assert!(matches("h(e|a)*llo*", "hll"));
        assert!(matches("h(e|a)*llo*", "xhllo") == false);

        // The pattern that sends backtrackers exponential.
        assert!(matches("(a|b)*c|(a|ab)*c", "abc"));
        assert!(matches("(a|b)*c|(a|ab)*c", "bbbcabbbc") == false);

        assert!(matches("a?(ab|ba)*", "ababababababababababababababababa"));

        assert!(matches("[^b-d]", "a"));
        assert!(matches("[^b-d]", "c") == false);
    }

    #[test]
    fn anchored() {
        assert!(matches("a", "a"));
        assert!(matches("a", "ab") == false);
        assert!(matches("a", "ba") == false);
        assert!(matches("b*", "abbb") == false);
        assert!(matches("b*", "bbba") == false);
    }

    #[test]
    fn empty_input() {
        assert!(matches(".*", ""));
        assert!(matches("a?", ""));
        assert!(matches("(a|b)?", ""));
        assert!(matches(".", "") == false);
        assert!(matches("a+", "") == false);
        assert!(matches("[bc]", "") == false);
    }

    #[test]
    fn dot_is_one_printable_byte() {
        assert!(matches(".", "a"));
        assert!(matches(".", "~"));
        assert!(matches(".", " "));
        assert!(matches(".", "\t") == false);
        assert!(matches(".", "ab") == false);
        // One non-ASCII char is more than one byte, and its bytes are
        // outside the printable range anyway.
        assert!(matches(".", "é") == false);
    }

    #[test]
    fn input_bytes_outside_printable_never_match() {
        assert!(matches("a.b", "a b"));
        assert!(matches("a.b", "a\0b") == false);
        assert!(matches("[^b-d]", "\t") == false);
    }

    #[test]
    fn negated_classes() {
        // [^ -/] excludes the low printables but also everything below
        // 0x20, since the emitted ranges only cover printable bytes.
        assert!(matches("[^ -/]", "0"));
        assert!(matches("[^ -/]", "\t") == false);
        assert!(matches("[^ -/]", "&") == false);

        assert!(matches("[^a]", "a") == false);
        assert!(matches("[^a]", "b"));

        // A multi-range negated class is the union of the per-range
        // complements, so each byte only has to avoid one of the ranges.
        assert!(matches("[^ab]", "a"));
        assert!(matches("[^ab]", "b"));
        assert!(matches("[^ab]", "z"));
    }

    #[test]
    fn classes() {
        assert!(matches("[a-c]+", "abccba"));
        assert!(matches("[a-c]+", "abd") == false);
        assert!(matches("[a-]", "a"));
        assert!(matches("[a-]", "-"));
        assert!(matches("[a-]", "b") == false);
        assert!(matches(r"[\]]", "]"));
        assert!(matches("[a^]", "^"));
    }

    #[test]
    fn escapes() {
        assert!(matches(r"\.", "."));
        assert!(matches(r"\.", "a") == false);
        assert!(matches(r"a\*", "a*"));
        assert!(matches(r"\-", "-"));
        assert!(matches(r"\(\)", "()"));
    }

    #[test]
    fn alternation_symmetry() {
        let lhs = Regex::new("ab+|(c|d)e").unwrap();
        let a = Regex::new("ab+").unwrap();
        let b = Regex::new("(c|d)e").unwrap();
        let mut cache = lhs.create_cache();
        for haystack in ["ab", "abbb", "ce", "de", "e", "abce", ""] {
            let expected = {
                cache.reset(&a);
                let left = a.is_match(&mut cache, haystack);
                cache.reset(&b);
                left || b.is_match(&mut cache, haystack)
            };
            cache.reset(&lhs);
            assert_eq!(lhs.is_match(&mut cache, haystack), expected, "{haystack:?}");
        }
    }

    #[test]
    fn concatenation_splits_the_input() {
        // a*ab accepts exactly the strings with a split point where a*
        // takes the prefix and ab the suffix.
        assert!(matches("a*ab", "ab"));
        assert!(matches("a*ab", "aab"));
        assert!(matches("a*ab", "aaaaab"));
        assert!(matches("a*ab", "b") == false);
        assert!(matches("a*ab", "ba") == false);
    }

    #[test]
    fn pathological_backtracking_case() {
        // a?a?a?a?aaaa against aaaa forces a backtracker through 2^n
        // paths; the parallel simulation stays linear.
        let re = Regex::new("a?a?a?a?aaaa").unwrap();
        let mut cache = re.create_cache();
        assert!(re.is_match(&mut cache, "aaaa"));
        assert!(re.is_match(&mut cache, "aaaaaaaa"));
        assert!(re.is_match(&mut cache, "aaaaaaaaa") == false);
        assert!(re.is_match(&mut cache, "aaa") == false);
    }

    #[test]
    fn repeated_calls_agree() {
        let re = Regex::new("h(e|a)*llo*").unwrap();
        let mut cache = re.create_cache();
        for _ in 0..3 {
            assert!(re.is_match(&mut cache, "haeeeallooo"));
            assert!(re.is_match(&mut cache, "h") == false);
        }
    }

    #[test]
    fn cache_migrates_between_regexes() {
        let digits = Regex::new("[0-9]+").unwrap();
        let word = Regex::new("(foo|bar)?baz").unwrap();
        let mut cache = digits.create_cache();
        assert!(digits.is_match(&mut cache, "2010"));
        cache.reset(&word);
        assert!(word.is_match(&mut cache, "foobaz"));
        assert!(word.is_match(&mut cache, "baz"));
        cache.reset(&digits);
        assert!(digits.is_match(&mut cache, "digits") == false);
    }

    #[test]
    #[should_panic(expected = "cache was not created for this Regex")]
    fn foreign_cache_panics() {
        let small = Regex::new("a").unwrap();
        let large = Regex::new("(abc|def)+").unwrap();
        let mut cache = small.create_cache();
        large.is_match(&mut cache, "abc");
    }

    #[test]
    fn builder_limits() {
        let err = Regex::builder()
            .nfa_size_limit(0)
            .build("abc")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExceededSizeLimit);

        let re = Regex::builder()
            .nfa_size_limit(1 << 16)
            .build("abc")
            .unwrap();
        let mut cache = re.create_cache();
        assert!(re.is_match(&mut cache, "abc"));
    }

    #[test]
    fn trailing_junk_is_ignored() {
        let re = Regex::new("ab)cd").unwrap();
        assert_eq!(re.parsed_len(), 2);
        assert_eq!(re.pattern(), "ab)cd");
        let mut cache = re.create_cache();
        assert!(re.is_match(&mut cache, "ab"));
        assert!(re.is_match(&mut cache, "ab)cd") == false);
    }

    #[test]
    fn cache_reports_memory_usage() {
        let re = Regex::new("(abc|def)*ghi").unwrap();
        let cache = re.create_cache();
        assert!(cache.memory_usage() > 0);
        assert!(re.nfa().memory_usage() > 0);
    }

    #[test]
    fn agrees_with_the_regex_crate() {
        // Same verdicts as regex's anchored search on the shared subset of
        // the syntax (no negated classes, whose semantics differ here).
        let cases: &[(&str, &[&str])] = &[
            ("h(e|a)*llo*", &["haeeeallooo", "hello", "hll", "h", "helloo", "hx"]),
            ("a?(ab|ba)*", &["", "a", "aab", "abba", "ababab", "aba"]),
            ("(a|b)*c", &["c", "abc", "bbbc", "cab", ""]),
            ("[a-c]+[0-9]", &["abc1", "a0", "d0", "abc", "9"]),
            (r"a\.b", &["a.b", "axb", "ab"]),
            (".*", &["", "anything at all", "~"]),
        ];
        for &(pattern, haystacks) in cases {
            let re = Regex::new(pattern).unwrap();
            let mut cache = re.create_cache();
            let oracle = regex::Regex::new(&format!("^(?:{pattern})$")).unwrap();
            for &haystack in haystacks {
                assert_eq!(
                    re.is_match(&mut cache, haystack),
                    oracle.is_match(haystack),
                    "pattern {pattern:?}, haystack {haystack:?}",
                );
            }
        }
    }
}
