use indexmap::IndexSet;
use mio::Token;
use std::collections::HashSet;

/// A named channel. Membership is owned here as `Token`s, resolved back to
/// `Client`s through the server's client table on use — there is no
/// shared-ownership or reference-counted link between a `Channel` and its
/// members, only keys.
pub struct Channel {
    pub name: String,
    pub topic: String,
    pub password: String,

    /// Insertion order, preserved: drives NAMES/JOIN broadcast ordering.
    pub roster: IndexSet<Token>,
    pub operators: HashSet<Token>,
    pub invited: HashSet<Token>,

    /// 0 means unlimited (+l).
    pub user_limit: usize,
    pub invite_only: bool,
    /// Defaults to true: only an operator may TOPIC until cleared.
    pub topic_restricted: bool,
}

impl Channel {
    /// Creates a channel with `creator` as its first (and, at creation
    /// time, only) operator.
    pub fn new(name: String, creator: Token) -> Self {
        let mut roster = IndexSet::new();
        roster.insert(creator);
        let mut operators = HashSet::new();
        operators.insert(creator);

        Channel {
            name,
            topic: String::new(),
            password: String::new(),
            roster,
            operators,
            invited: HashSet::new(),
            user_limit: 0,
            invite_only: false,
            topic_restricted: true,
        }
    }

    pub fn is_member(&self, token: Token) -> bool {
        self.roster.contains(&token)
    }

    pub fn is_operator(&self, token: Token) -> bool {
        self.operators.contains(&token)
    }

    /// Removes `token` from the roster and operator set. Order-preserving
    /// so any concurrent iteration indices elsewhere stay valid.
    pub fn remove_member(&mut self, token: Token) {
        self.roster.shift_remove(&token);
        self.operators.remove(&token);
        self.invited.remove(&token);
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Mode string in fixed letter order `itkl`, with `k`/`l` arguments
    /// appended after the letter block. Pure function of current state,
    /// so equal state always yields a byte-equal string.
    pub fn mode_string(&self) -> String {
        let mut letters = String::from("+");
        let mut args = Vec::new();

        if self.invite_only {
            letters.push('i');
        }
        if self.topic_restricted {
            letters.push('t');
        }
        if !self.password.is_empty() {
            letters.push('k');
            args.push(self.password.clone());
        }
        if self.user_limit > 0 {
            letters.push('l');
            args.push(self.user_limit.to_string());
        }

        if args.is_empty() {
            letters
        } else {
            format!("{letters} {}", args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(n: usize) -> Token {
        Token(n)
    }

    #[test]
    fn creator_becomes_first_operator() {
        let ch = Channel::new("#lobby".to_string(), tok(1));
        assert!(ch.is_member(tok(1)));
        assert!(ch.is_operator(tok(1)));
    }

    #[test]
    fn remove_member_clears_all_sets() {
        let mut ch = Channel::new("#lobby".to_string(), tok(1));
        ch.roster.insert(tok(2));
        ch.invited.insert(tok(2));
        ch.remove_member(tok(2));
        assert!(!ch.is_member(tok(2)));
        assert!(!ch.invited.contains(&tok(2)));
    }

    #[test]
    fn empty_after_last_member_leaves() {
        let mut ch = Channel::new("#lobby".to_string(), tok(1));
        ch.remove_member(tok(1));
        assert!(ch.is_empty());
    }

    #[test]
    fn mode_string_fixed_order_and_deterministic() {
        let mut ch = Channel::new("#lobby".to_string(), tok(1));
        ch.invite_only = true;
        ch.topic_restricted = true;
        ch.password = "secret".to_string();
        ch.user_limit = 10;
        assert_eq!(ch.mode_string(), "+itkl secret 10");
        assert_eq!(ch.mode_string(), ch.mode_string());
    }

    #[test]
    fn mode_string_no_args_when_no_key_or_limit() {
        let ch = Channel::new("#lobby".to_string(), tok(1));
        assert_eq!(ch.mode_string(), "+t");
    }
}
