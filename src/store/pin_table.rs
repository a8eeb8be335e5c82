use crate::models::Pin;

/// Pins of one room, kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct PinTable {
    pins: Vec<Pin>,
}

impl PinTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pins(pins: Vec<Pin>) -> Self {
        Self { pins }
    }

    pub fn get(&self, pin_id: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == pin_id)
    }

    pub fn contains(&self, pin_id: &str) -> bool {
        self.get(pin_id).is_some()
    }

    pub fn insert(&mut self, pin: Pin) {
        self.pins.push(pin);
    }

    /// Swap in a new version of an existing pin. Returns false when the pin
    /// is gone.
    pub fn replace(&mut self, pin: Pin) -> bool {
        match self.pins.iter_mut().find(|p| p.id == pin.id) {
            Some(slot) => {
                *slot = pin;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, pin_id: &str) -> Option<Pin> {
        let idx = self.pins.iter().position(|p| p.id == pin_id)?;
        Some(self.pins.remove(idx))
    }

    pub fn list(&self) -> Vec<Pin> {
        self.pins.clone()
    }

    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.pins.iter().map(|p| (p.latitude, p.longitude)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPin;

    fn pin(title: &str) -> Pin {
        Pin::new("r1", NewPin::parse(title, None, 1.0, 2.0, "ann").unwrap())
    }

    #[test]
    fn listing_is_stable_and_ordered() {
        let mut table = PinTable::new();
        for title in ["a", "b", "c"] {
            table.insert(pin(title));
        }
        let first: Vec<String> = table.list().into_iter().map(|p| p.title).collect();
        let second: Vec<String> = table.list().into_iter().map(|p| p.title).collect();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn replace_after_remove_does_not_resurrect() {
        let mut table = PinTable::new();
        let mut p = pin("a");
        table.insert(p.clone());

        p.toggle_vote("bob");
        assert_eq!(table.remove(&p.id).map(|r| r.title), Some("a".to_string()));
        assert!(!table.replace(p.clone()));
        assert!(table.is_empty());
        assert!(table.remove(&p.id).is_none());
    }
}
