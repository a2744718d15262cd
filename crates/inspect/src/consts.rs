use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// The rest-of-line capture stops at the newline; the value is trimmed after
// capture so trailing carriage returns from CRLF metadata don't leak in.
regex!(SITE_REGEX, r"Site: (.*)");
