use std::collections::HashMap;

/// Named members of one extensible type.
///
/// Registration is "extend-or-warn": a name that already maps to a different
/// member is replaced, with a warning. Re-registering an identical member is
/// silent.
#[derive(Debug, Clone)]
pub struct MethodTable<M> {
    type_name: &'static str,
    members: HashMap<String, M>,
}

impl<M: PartialEq + Clone> MethodTable<M> {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            members: HashMap::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Adds every member, returning the names whose previous value was replaced.
    pub fn implement<I, S>(&mut self, members: I) -> Vec<String>
    where
        I: IntoIterator<Item = (S, M)>,
        S: Into<String>,
    {
        let mut overwritten = Vec::new();
        for (name, member) in members {
            let name = name.into();
            match self.members.get(&name) {
                Some(existing) if *existing == member => continue,
                Some(_) => {
                    tracing::warn!(
                        type_name = self.type_name,
                        member = %name,
                        "overwriting existing member"
                    );
                    overwritten.push(name.clone());
                }
                None => {}
            }
            self.members.insert(name, member);
        }
        overwritten
    }

    pub fn get(&self, name: &str) -> Option<&M> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Sorted member names.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.members.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
