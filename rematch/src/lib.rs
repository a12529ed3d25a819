/*!
A small anchored regular expression engine built on the Thompson NFA
construction.

A pattern is compiled by a recursive-descent parser that emits NFA states
into a flat arena as it goes, and inputs are matched by simulating all
active NFA states in parallel, one input byte per step. That gives worst
case `O(m * n)` matching time, where `m` is proportional to the size of the
pattern and `n` to the size of the input, with none of the exponential
blowup of backtracking engines.

## Features
- The classic operators: concatenation, alternation (`|`), repetition
  (`*`, `+`, `?`), grouping (`(...)`), the wildcard `.` and character
  classes (`[a-z]`, `[^a-z]`), over printable ASCII.
- Matching is anchored and boolean: a pattern matches a string when it
  consumes all of it, and the engine reports only the verdict.
- Compile-time diagnostics with exact byte offsets, and configurable
  compile-time limits on NFA size and nesting depth.
- Compile once, search from many threads: a compiled [`matcher::Regex`] is
  immutable and cheap to clone, and each thread brings its own
  [`matcher::Cache`] of working buffers. Searching allocates nothing.

There is no Unicode support, no substring search, and no capture groups,
counted repetition, or look-around; patterns and inputs live in the
printable byte range `0x20..=0x7E`. See [`syntax`] for the full grammar.

## Usage
```
use rematch::matcher::Regex;

let re = Regex::new("h(e|a)*llo*")?;
let mut cache = re.create_cache();
assert!(re.is_match(&mut cache, "haeeeallooo"));
assert!(!re.is_match(&mut cache, "hillo"));
# Ok::<(), rematch::nfa::BuildError>(())
```

Compile errors name the offending byte:

```
use rematch::{matcher::Regex, nfa::ErrorKind};

let err = Regex::new("h(e|allo").unwrap_err();
assert_eq!(err.kind(), ErrorKind::ExpectedCloseParen);
assert_eq!(err.offset(), 8);
assert_eq!(err.to_string(), "expected ')' at offset 8");
```
*/

pub mod matcher;
pub mod nfa;
pub mod syntax;

#[cfg(test)]
mod tests {
    use crate::matcher::Regex;

    #[test]
    fn shared_across_threads() {
        let re = Regex::new("(a|b)+c?").unwrap();
        std::thread::scope(|scope| {
            for (haystack, expected) in [("ababc", true), ("bbb", true), ("c", false), ("abx", false)] {
                let re = re.clone();
                scope.spawn(move || {
                    let mut cache = re.create_cache();
                    assert_eq!(re.is_match(&mut cache, haystack), expected, "{haystack:?}");
                });
            }
        });
    }
}
