use serde::{Deserialize, Serialize};

pub type DogId = i32;

/// A dog held by the shelter.
///
/// `owner` is `None` until the dog is adopted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dog {
    pub id: DogId,
    pub name: String,
    pub owner: Option<String>,
    pub description: String,
}

impl Dog {
    pub fn new(id: DogId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            description: description.into(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Returns a copy of this record that differs only in its owner.
    pub fn adopted_by(&self, owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatFact {
    pub fact: String,
}

/// Payload returned by the cat facts provider. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatFacts {
    #[serde(default)]
    pub facts: Vec<CatFact>,
}

impl CatFacts {
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl FromIterator<CatFact> for CatFacts {
    fn from_iter<I: IntoIterator<Item = CatFact>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adopted_by_changes_only_the_owner() {
        let dog = Dog::new(7, "Prancer", "A demonic, neurotic, man hating, animal hating, children hating dog")
            .with_owner("nobody");

        let adopted = dog.adopted_by("alice");

        assert_eq!(adopted.id, 7);
        assert_eq!(adopted.name, dog.name);
        assert_eq!(adopted.description, dog.description);
        assert_eq!(adopted.owner.as_deref(), Some("alice"));
    }

    #[test]
    fn cat_facts_ignore_unknown_fields() {
        let payload = r#"{"facts":[{"fact":"Cats sleep a lot.","fact_number":1}],"page":1}"#;
        let facts: CatFacts = serde_json::from_str(payload).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts.facts[0].fact, "Cats sleep a lot.");
    }
}
