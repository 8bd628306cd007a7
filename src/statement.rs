//! CLI statement builder
//!
//! Generated lines are either `#` comments or space-separated `set`
//! statements. Operator-supplied text goes through this builder so a key
//! or region name containing whitespace, quotes or line breaks cannot
//! split or corrupt a statement.

/// Builder for a single `set ...` statement
#[derive(Debug, Clone)]
pub struct Statement {
    tokens: Vec<String>,
}

impl Statement {
    pub fn set() -> Self {
        Self {
            tokens: vec!["set".to_string()],
        }
    }

    /// `set template <template> config network ike gateway <gateway>`
    pub fn ike_gateway(template: &str, gateway: &str) -> Self {
        Self::set()
            .words("template")
            .value(template)
            .words("config network ike gateway")
            .value(gateway)
    }

    /// `set template <template> config network tunnel ipsec <tunnel>`
    pub fn ipsec_tunnel(template: &str, tunnel: &str) -> Self {
        Self::set()
            .words("template")
            .value(template)
            .words("config network tunnel ipsec")
            .value(tunnel)
    }

    /// `set plugins cloud_services multi-tenant tenants <tenant> remote-networks onboarding <name>`
    pub fn onboarding(tenant: &str, name: &str) -> Self {
        Self::set()
            .words("plugins cloud_services multi-tenant tenants")
            .value(tenant)
            .words("remote-networks onboarding")
            .value(name)
    }

    /// Append fixed keywords, split on whitespace
    pub fn words(mut self, words: &str) -> Self {
        self.tokens.extend(words.split_whitespace().map(str::to_string));
        self
    }

    /// Append an operator value, quoting it only when required
    pub fn value(mut self, value: &str) -> Self {
        self.tokens.push(escape_value(value));
        self
    }

    /// Append a value that is always emitted as a quoted string
    pub fn quoted(mut self, value: &str) -> Self {
        self.tokens.push(quote(value));
        self
    }

    /// Append a bracketed list: `[ a b c ]`
    ///
    /// List members are whitespace-delimited, so an item containing
    /// whitespace contributes one member per word.
    pub fn list<S: AsRef<str>>(mut self, items: &[S]) -> Self {
        self.tokens.push("[".to_string());
        self.tokens.extend(
            items
                .iter()
                .flat_map(|item| item.as_ref().split_whitespace())
                .map(escape_value),
        );
        self.tokens.push("]".to_string());
        self
    }

    pub fn build(self) -> String {
        self.tokens.join(" ")
    }
}

/// A `#` comment line
///
/// Line breaks and other control characters become spaces.
pub fn comment(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    format!("# {cleaned}")
}

/// First character of `value` that cannot appear inside a statement
///
/// Tabs are kept (inside quotes); line breaks and other control characters
/// would split or corrupt the line.
pub fn unrepresentable(value: &str) -> Option<char> {
    value.chars().find(|&c| is_dropped(c))
}

fn is_dropped(c: char) -> bool {
    c.is_control() && c != '\t'
}

fn escape_value(value: &str) -> String {
    let cleaned: String = value.chars().filter(|&c| !is_dropped(c)).collect();
    let needs_quotes = cleaned.is_empty()
        || cleaned
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\\'));
    if needs_quotes {
        quote(&cleaned)
    } else {
        cleaned
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars().filter(|&c| !is_dropped(c)) {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
