//! services/api/src/adapters/robots.rs
//!
//! A small robots.txt reader: enough to honour `Allow`/`Disallow` path prefixes
//! for our user agent or the `*` group.

/// Rules that apply to us from one robots.txt file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    allow: Vec<String>,
    disallow: Vec<String>,
}

impl RobotsRules {
    /// Everything permitted (e.g. the site has no robots.txt).
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Nothing permitted (e.g. robots.txt is behind auth).
    pub fn deny_all() -> Self {
        Self {
            allow: Vec::new(),
            disallow: vec!["/".to_string()],
        }
    }

    /// Parses the groups addressed to `agent` (matched case-insensitively as a
    /// substring of the product token) or, if none exist, to `*`.
    pub fn parse(text: &str, agent: &str) -> Self {
        let agent = agent.to_lowercase();
        let agent_token = agent.split('/').next().unwrap_or_default().to_string();

        let mut specific = RobotsRules::default();
        let mut wildcard = RobotsRules::default();
        let mut saw_specific = false;

        // Agents named by the current group, and whether we are still reading its
        // User-agent lines.
        let mut group_agents: Vec<String> = Vec::new();
        let mut in_agent_lines = false;

        for raw in text.lines() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let field = field.trim().to_lowercase();
            let value = value.trim();

            match field.as_str() {
                "user-agent" => {
                    if !in_agent_lines {
                        group_agents.clear();
                    }
                    group_agents.push(value.to_lowercase());
                    in_agent_lines = true;
                }
                "allow" | "disallow" => {
                    in_agent_lines = false;
                    if value.is_empty() {
                        continue;
                    }
                    let matches_us = !agent_token.is_empty()
                        && group_agents
                            .iter()
                            .any(|a| a != "*" && agent_token.contains(a.as_str()));
                    let targets = if matches_us {
                        saw_specific = true;
                        Some(&mut specific)
                    } else if group_agents.iter().any(|a| a == "*") {
                        Some(&mut wildcard)
                    } else {
                        None
                    };
                    if let Some(rules) = targets {
                        if field == "allow" {
                            rules.allow.push(value.to_string());
                        } else {
                            rules.disallow.push(value.to_string());
                        }
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        if saw_specific {
            specific
        } else {
            wildcard
        }
    }

    /// The longest matching rule wins; `Allow` wins a tie. Rules may use `*`
    /// for any run of characters and a trailing `$` to anchor the end.
    pub fn is_allowed(&self, path: &str) -> bool {
        let longest = |rules: &[String]| {
            rules
                .iter()
                .filter(|rule| rule_matches(rule, path))
                .map(String::len)
                .max()
        };

        match (longest(&self.allow), longest(&self.disallow)) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(allow), Some(disallow)) => allow >= disallow,
        }
    }
}

/// Matches a robots.txt path rule against a path (plus query string).
fn rule_matches(rule: &str, path: &str) -> bool {
    let (pattern, anchored) = match rule.strip_suffix('$') {
        Some(p) => (p, true),
        None => (rule, false),
    };

    let mut pieces = pattern.split('*');
    let head = pieces.next().unwrap_or_default();
    let Some(mut rest) = path.strip_prefix(head) else {
        return false;
    };

    let pieces: Vec<&str> = pieces.collect();
    if pieces.is_empty() {
        return !anchored || rest.is_empty();
    }

    for (i, piece) in pieces.iter().enumerate() {
        if anchored && i == pieces.len() - 1 {
            return rest.ends_with(piece);
        }
        match rest.find(piece) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = "\
# sample
User-agent: *
Disallow: /cart
Disallow: /search
Allow: /search/public

User-agent: BadBot
Disallow: /
";

    #[test]
    fn wildcard_group_applies() {
        let rules = RobotsRules::parse(ROBOTS, "AutoPartsFinder/0.1.0");
        assert!(rules.is_allowed("/c/brakes"));
        assert!(!rules.is_allowed("/search?q=brake+pads"));
        assert!(rules.is_allowed("/search/public?q=x"));
        assert!(!rules.is_allowed("/cart"));
    }

    #[test]
    fn specific_group_overrides_wildcard() {
        let rules = RobotsRules::parse(ROBOTS, "BadBot/2.0");
        assert!(!rules.is_allowed("/c/brakes"));
    }

    #[test]
    fn empty_disallow_allows_everything() {
        let rules = RobotsRules::parse("User-agent: *\nDisallow:\n", "AutoPartsFinder");
        assert!(rules.is_allowed("/anything"));
    }

    #[test]
    fn shared_group_lines() {
        let text = "User-agent: foo\nUser-agent: *\nDisallow: /private\n";
        let rules = RobotsRules::parse(text, "AutoPartsFinder");
        assert!(!rules.is_allowed("/private/x"));
    }

    #[test]
    fn wildcards_match_anywhere() {
        let rules = RobotsRules::parse(
            "User-agent: *\nDisallow: /*?q=\nDisallow: /search*\n",
            "AutoPartsFinder/0.1.0",
        );
        assert!(!rules.is_allowed("/search?q=brake"));
        assert!(!rules.is_allowed("/c/brakes?q=pads"));
        assert!(!rules.is_allowed("/searchresults"));
        assert!(rules.is_allowed("/c/brakes"));
    }

    #[test]
    fn dollar_anchors_the_end() {
        let rules = RobotsRules::parse(
            "User-agent: *\nDisallow: /*.pdf$\nDisallow: /cart$\n",
            "AutoPartsFinder",
        );
        assert!(!rules.is_allowed("/manuals/brakes.pdf"));
        assert!(rules.is_allowed("/manuals/brakes.pdf?page=2"));
        assert!(!rules.is_allowed("/cart"));
        assert!(rules.is_allowed("/cart/items"));
    }

    #[test]
    fn longer_wildcard_allow_beats_disallow() {
        let rules = RobotsRules::parse(
            "User-agent: *\nDisallow: /*?\nAllow: /search?q=*\n",
            "AutoPartsFinder",
        );
        assert!(rules.is_allowed("/search?q=brake+pads"));
        assert!(!rules.is_allowed("/c/brakes?sort=price"));
    }

    #[test]
    fn deny_all_blocks_root() {
        assert!(!RobotsRules::deny_all().is_allowed("/"));
        assert!(RobotsRules::allow_all().is_allowed("/"));
    }
}
