use rustc_hash::FxHashMap;

/// Dense ids for chromosome names, shared by the left and right breakpoint indexes
#[derive(Debug, Default)]
pub struct ChromIndex {
    name_to_id: FxHashMap<String, u32>,
    id_to_name: Vec<String>,
}

impl ChromIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_id(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.id_to_name.len() as u32;
        self.name_to_id.insert(name.to_owned(), id);
        self.id_to_name.push(name.to_owned());
        id
    }

    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    /// Chromosome names in natural order (chr2 before chr10)
    pub fn names_natural(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.id_to_name.iter().map(String::as_str).collect();
        names.sort_by(|a, b| natord::compare(a, b));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut index = ChromIndex::new();
        assert_eq!(index.get_or_insert_id("chr1"), 0);
        assert_eq!(index.get_or_insert_id("chr2"), 1);
        assert_eq!(index.get_or_insert_id("chr1"), 0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get_id("chr2"), Some(1));
        assert_eq!(index.get_id("chrX"), None);
    }

    #[test]
    fn test_natural_order() {
        let mut index = ChromIndex::new();
        for name in ["chr10", "chrX", "chr2", "chr1"] {
            index.get_or_insert_id(name);
        }
        assert_eq!(index.names_natural(), vec!["chr1", "chr2", "chr10", "chrX"]);
    }
}
