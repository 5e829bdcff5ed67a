/// Upstream cookie jar: ordered `name=value` pairs, one entry per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Build a jar from `name=value` strings; malformed entries are skipped.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut jar = Self::default();
        for p in pairs {
            if let Some((name, value)) = split_pair(p.as_ref()) {
                jar.set(name, value);
            }
        }
        jar
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self.pairs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.pairs.push((name.to_string(), value.to_string())),
        }
    }

    /// Add the client-identification cookies the upstream expects on every call.
    pub fn with_client_defaults(mut self, app_version: &str) -> Self {
        if self.get("appver").is_none() {
            self.set("appver", app_version);
        }
        if self.get("os").is_none() {
            self.set("os", "pc");
        }
        self
    }

    /// Fold `Set-Cookie` header values into the jar. Attributes after the first `;` are ignored.
    pub fn merge_set_cookie<'a>(&mut self, headers: impl IntoIterator<Item = &'a str>) {
        for header in headers {
            let first = header.split(';').next().unwrap_or_default();
            if let Some((name, value)) = split_pair(first) {
                self.set(name, value);
            }
        }
    }

    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_pairs(self) -> Vec<String> {
        self.pairs
            .into_iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect()
    }
}

// Values may themselves contain `=` (base64 tokens), so split once.
fn split_pair(raw: &str) -> Option<(&str, &str)> {
    let (name, value) = raw.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_only_fill_missing() {
        let jar = CookieJar::from_pairs(["os=osx"]).with_client_defaults("3.1.11");
        assert_eq!(jar.get("os"), Some("osx"));
        assert_eq!(jar.get("appver"), Some("3.1.11"));
    }

    #[test]
    fn set_cookie_overrides_by_name() {
        let mut jar = CookieJar::from_pairs(["MUSIC_U=old", "os=pc"]);
        jar.merge_set_cookie([
            "MUSIC_U=new==; Max-Age=100; Path=/",
            "NMTID=abc; HttpOnly",
        ]);
        assert_eq!(jar.get("MUSIC_U"), Some("new=="));
        assert_eq!(jar.header_value(), "MUSIC_U=new==; os=pc; NMTID=abc");
    }

    #[test]
    fn malformed_pairs_are_skipped() {
        let jar = CookieJar::from_pairs(["junk", "=x", "a=1"]);
        assert_eq!(jar.into_pairs(), vec!["a=1".to_string()]);
    }
}
