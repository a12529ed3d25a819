use rematch::matcher::Regex;

fn main() {
    let re = Regex::new("h(e|a)*llo*").unwrap();
    let mut cache = re.create_cache();
    assert!(re.is_match(&mut cache, "haeeeallooo"));
    assert!(re.is_match(&mut cache, "hello world") == false);
    // Matching is anchored: the pattern has to consume the whole input.

    let re = Regex::new("[^b-d]").unwrap();
    let mut cache = re.create_cache();
    assert!(re.is_match(&mut cache, "a"));
    assert!(re.is_match(&mut cache, "c") == false);

    // Compile errors point at the offending byte.
    let err = Regex::new("h(e|allo").unwrap_err();
    println!("h(e|allo: {err}");
}
