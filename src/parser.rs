use crate::error::{Result, TnsError};
use crate::tree::*;

/// Where the cursor currently points: the table root, or an entry inside it.
enum Slot<'t> {
    Root(&'t mut EntryMap),
    Node(&'t mut Entry),
}

/// Character-driven TNS parser.
///
/// Fed one character at a time. `=`, `(` and `)` are operators; every other
/// character (whitespace included) is accumulated into the key or value
/// buffer. Comment handling belongs to the caller.
///
/// The cursor never holds a reference into the tree. It keeps the key path
/// that was last entered and re-walks it from the root whenever it needs the
/// node, so replacing a node with a list can't leave it dangling.
pub struct Parser<'a> {
    entries: &'a mut EntryMap,
    search: &'a mut SearchIndex,

    open_count: usize,
    close_count: usize,
    in_key: bool,
    key: String,
    value: String,
    /// Keys from the root down to the key currently being defined.
    tree: Vec<String>,
    /// Key path of the node that receives the next leaf.
    position: Vec<String>,
    /// Alias being built.
    name: String,
}

impl<'a> Parser<'a> {
    pub fn new(entries: &'a mut EntryMap, search: &'a mut SearchIndex) -> Self {
        Parser {
            entries,
            search,
            open_count: 0,
            close_count: 0,
            in_key: true,
            key: String::new(),
            value: String::new(),
            tree: Vec::new(),
            position: Vec::new(),
            name: String::new(),
        }
    }

    /// Feed every character of `chunk`.
    pub fn feed_str(&mut self, chunk: &str) -> Result<()> {
        for ch in chunk.chars() {
            self.feed(ch)?;
        }
        Ok(())
    }

    pub fn feed(&mut self, ch: char) -> Result<()> {
        match ch {
            '=' => self.equal_operator(),
            '(' => self.open_paren_operator()?,
            ')' => self.close_paren_operator()?,
            _ => self.no_operator(ch),
        }
        Ok(())
    }

    // ── Operators ───────────────────────────────────────────────────

    fn equal_operator(&mut self) {
        self.in_key = false;
        let key = self.key.trim().to_string();
        if self.tree.is_empty() {
            self.name = key.clone();
            self.search.insert(key.clone(), Vec::new());
        }
        self.tree.push(key);
        self.key.clear();
    }

    fn open_paren_operator(&mut self) -> Result<()> {
        self.open_count += 1;
        self.in_key = true;
        self.update_position()
    }

    fn close_paren_operator(&mut self) -> Result<()> {
        self.close_count += 1;

        if !self.value.is_empty() {
            self.populate_entry()?;
        }

        self.tree.pop();
        self.value.clear();
        self.in_key = true;

        if self.open_count == self.close_count {
            self.finished_entry();
        }
        Ok(())
    }

    fn no_operator(&mut self, ch: char) {
        if self.in_key {
            self.key.push(ch);
        } else {
            self.value.push(ch);
        }
    }

    // ── Tree position ───────────────────────────────────────────────

    /// Re-seat the cursor on the node named by the current key path,
    /// creating empty objects along the way.
    fn update_position(&mut self) -> Result<()> {
        self.position = self.tree.clone();
        if let Err(message) = walk(self.entries, &self.position) {
            return Err(TnsError::structural(&self.name, &self.position, message));
        }
        Ok(())
    }

    /// Attach the trimmed value buffer under the last key of the tree path.
    fn populate_entry(&mut self) -> Result<()> {
        let Some(key) = self.tree.last().cloned() else {
            // A value with no key ever declared has nowhere to go.
            return Ok(());
        };
        let value = self.value.trim().to_string();

        let slot = walk(self.entries, &self.position)
            .map_err(|message| TnsError::structural(&self.name, &self.position, message))?;

        let collided = match slot {
            Slot::Root(map) => {
                if map.contains_key(&key) {
                    return Err(TnsError::structural(
                        &self.name,
                        &self.tree,
                        format!("top-level key {} repeated outside of an entry", key),
                    ));
                }
                map.insert(key.clone(), Entry::Leaf(value.clone()));
                None
            }
            Slot::Node(node) => match node {
                Entry::Object(map) => {
                    if map.contains_key(&key) {
                        Some(Entry::Object(map.clone()))
                    } else {
                        map.insert(key.clone(), Entry::Leaf(value.clone()));
                        None
                    }
                }
                Entry::List(items) => {
                    fill_list(items, &key, &value)
                        .map_err(|message| TnsError::structural(&self.name, &self.tree, message))?;
                    None
                }
                Entry::Leaf(existing) => {
                    return Err(TnsError::structural(
                        &self.name,
                        &self.tree,
                        format!("cannot add {} to leaf value \"{}\"", key, existing),
                    ));
                }
            },
        };

        if let Some(existing) = collided {
            self.merge_to_list(existing, &key, &value)?;
        }

        self.search
            .entry(self.name.clone())
            .or_default()
            .push(value);
        Ok(())
    }

    /// Sibling collision: the object at the cursor already holds `key`.
    /// Its slot becomes `[existing, {key: value}]` and the key goes back on
    /// the path so later siblings collide against the list.
    fn merge_to_list(&mut self, existing: Entry, key: &str, value: &str) -> Result<()> {
        self.tree.pop();
        let slot = walk(self.entries, &self.tree)
            .map_err(|message| TnsError::structural(&self.name, &self.tree, message))?;
        match slot {
            Slot::Node(node) => {
                *node = Entry::List(vec![existing, Entry::single(key, value)]);
            }
            Slot::Root(_) => {
                return Err(TnsError::structural(
                    &self.name,
                    &self.tree,
                    format!("cannot merge repeated key {} into the alias table", key),
                ));
            }
        }
        self.position = self.tree.clone();
        self.tree.push(key.to_string());
        Ok(())
    }

    fn finished_entry(&mut self) {
        tracing::trace!(alias = %self.name, "finished entry");
        self.open_count = 0;
        self.close_count = 0;
        self.key.clear();
        self.value.clear();
        self.name.clear();
        self.tree.clear();
        self.position.clear();
    }
}

/// Walk `path` from the root, inserting empty objects for missing keys.
///
/// A list on the way is entered through its last element, the sibling
/// currently being filled in.
fn walk<'t>(entries: &'t mut EntryMap, path: &[String]) -> Result<Slot<'t>, String> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(Slot::Root(entries));
    };
    let mut node = entries.entry(first.clone()).or_default();
    for key in rest {
        node = child_slot(node, key)?;
    }
    Ok(Slot::Node(node))
}

fn child_slot<'t>(node: &'t mut Entry, key: &str) -> Result<&'t mut Entry, String> {
    let map = match node {
        Entry::Object(map) => map,
        Entry::List(items) => {
            if items.is_empty() {
                items.push(Entry::object());
            }
            match items.last_mut() {
                Some(Entry::Object(map)) => map,
                _ => return Err(format!("cannot enter {}: list holds a non-object", key)),
            }
        }
        Entry::Leaf(value) => {
            return Err(format!("cannot enter {}: parent is leaf value \"{}\"", key, value));
        }
    };
    Ok(map.entry(key.to_string()).or_default())
}

/// Third-or-later sibling: set `key` on the first element lacking it, or on
/// a new element when every element already has it.
fn fill_list(items: &mut Vec<Entry>, key: &str, value: &str) -> Result<(), String> {
    let mut target = None;
    for (i, item) in items.iter().enumerate() {
        match item {
            Entry::Object(map) => {
                if !map.contains_key(key) {
                    target = Some(i);
                    break;
                }
            }
            _ => return Err(format!("cannot add {}: list holds a non-object", key)),
        }
    }
    let index = match target {
        Some(i) => i,
        None => {
            items.push(Entry::object());
            items.len() - 1
        }
    };
    if let Entry::Object(map) = &mut items[index] {
        map.insert(key.to_string(), Entry::Leaf(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> (EntryMap, SearchIndex) {
        let mut entries = EntryMap::new();
        let mut search = SearchIndex::new();
        Parser::new(&mut entries, &mut search)
            .feed_str(input)
            .unwrap();
        (entries, search)
    }

    #[test]
    fn test_counts_balance_at_alias_boundary() {
        let mut entries = EntryMap::new();
        let mut search = SearchIndex::new();
        let mut parser = Parser::new(&mut entries, &mut search);

        parser.feed_str("A = (B = (C = 1)").unwrap();
        assert_eq!((parser.open_count, parser.close_count), (2, 1));
        assert_eq!(parser.tree.len(), 2);

        parser.feed(')').unwrap();
        assert_eq!((parser.open_count, parser.close_count), (0, 0));
        assert!(parser.tree.is_empty());
        assert!(parser.position.is_empty());
    }

    #[test]
    fn test_single_leaf() {
        let (entries, search) = parse("X = (A = 1)");
        assert_eq!(entries["X"], Entry::single("A", "1"));
        assert_eq!(search["X"], vec!["1"]);
    }

    #[test]
    fn test_nested_objects() {
        let (entries, _) = parse("X = (D = (A = 1)(B = 2))");
        let d = entries["X"].get("D").unwrap().as_object().unwrap();
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let (entries, search) = parse("  X  =  (  HOST  =  db.local  )  ");
        assert_eq!(entries["X"].get("HOST").unwrap().as_leaf(), Some("db.local"));
        assert_eq!(search.keys().collect::<Vec<_>>(), vec!["X"]);
    }

    #[test]
    fn test_sibling_collision_makes_list() {
        let (entries, search) =
            parse("X = (L = (ADDRESS = (HOST = a)(PORT = 1))(ADDRESS = (HOST = b)(PORT = 2)))");
        let list = entries["X"].path(&["L", "ADDRESS"]).unwrap().as_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].get("HOST").unwrap().as_leaf(), Some("a"));
        assert_eq!(list[0].get("PORT").unwrap().as_leaf(), Some("1"));
        assert_eq!(list[1].get("HOST").unwrap().as_leaf(), Some("b"));
        assert_eq!(list[1].get("PORT").unwrap().as_leaf(), Some("2"));
        assert_eq!(search["X"], vec!["a", "1", "b", "2"]);
    }

    #[test]
    fn test_third_sibling_appends() {
        let (entries, search) =
            parse("X = (L = (A = (H = a)(P = 1))(A = (H = b)(P = 2))(A = (H = c)(P = 3)))");
        let list = entries["X"].path(&["L", "A"]).unwrap().as_list().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2], {
            let mut map = EntryMap::new();
            map.insert("H".into(), "c".into());
            map.insert("P".into(), "3".into());
            Entry::Object(map)
        });
        assert_eq!(search["X"].len(), 6);
    }

    #[test]
    fn test_list_fills_first_element_missing_key() {
        // The first block has no P, so the second block's P lands there.
        let (entries, _) =
            parse("X = (L = (A = (H = a))(A = (H = b)(P = 2))(A = (H = c)(P = 3)))");
        let list = entries["X"].path(&["L", "A"]).unwrap().as_list().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].get("P").unwrap().as_leaf(), Some("2"));
        assert_eq!(list[1].get("P").unwrap().as_leaf(), Some("3"));
        assert_eq!(list[2].get("H").unwrap().as_leaf(), Some("c"));
        assert!(list[2].get("P").is_none());
    }

    #[test]
    fn test_blank_value_is_empty_leaf() {
        let (entries, search) = parse("X = (L = (A = )(B = 2))");
        let x = entries["X"].get("L").unwrap().as_object().unwrap();
        assert_eq!(x.get("A").unwrap().as_leaf(), Some(""));
        assert_eq!(x.get("B").unwrap().as_leaf(), Some("2"));
        assert_eq!(search["X"], vec!["", "2"]);
    }

    #[test]
    fn test_empty_value_buffer_is_skipped() {
        // No whitespace anywhere, so nothing reaches the value buffer for A.
        let (entries, search) = parse("X=(L=(A=)(B=2))");
        let x = entries["X"].get("L").unwrap().as_object().unwrap();
        assert!(x.get("A").is_none());
        assert_eq!(x.get("B").unwrap().as_leaf(), Some("2"));
        assert_eq!(search["X"], vec!["2"]);
    }

    #[test]
    fn test_key_on_leaf_is_structural_error() {
        let mut entries = EntryMap::new();
        let mut search = SearchIndex::new();
        let err = Parser::new(&mut entries, &mut search)
            .feed_str("X = (L = (A = 1)(A = (B = 2)))")
            .unwrap_err();
        assert_eq!(err.code(), "tns-structural-error");
        match err {
            TnsError::Structural { alias, .. } => assert_eq!(alias, "X"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_nested_block_inside_list_element() {
        let (entries, _) = parse("X = (L = (A = (H = a))(A = (H = b)(OPT = (K = v))))");
        let list = entries["X"].path(&["L", "A"]).unwrap().as_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].path(&["OPT", "K"]).unwrap().as_leaf(), Some("v"));
        assert!(list[0].get("OPT").is_none());
    }

    #[test]
    fn test_aliases_accumulate_within_one_parse() {
        let (entries, search) = parse("A = (K = 1)\nB = (K = 2)");
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(search["A"], vec!["1"]);
        assert_eq!(search["B"], vec!["2"]);
    }
}
