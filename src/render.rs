use crate::tree::*;

const INDENT: &str = "    ";

/// Writes entries back out as TNS text, four spaces per nesting level.
struct TnsWriter {
    buf: String,
    depth: usize,
}

impl TnsWriter {
    fn new() -> Self {
        TnsWriter {
            buf: String::new(),
            depth: 0,
        }
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
    }

    fn write_alias(&mut self, name: &str, entry: &Entry) {
        match entry {
            Entry::Object(map) => {
                self.buf.push_str(name);
                self.buf.push_str(" =");
                self.write_children(map);
            }
            // One block per element; parsing them back merges into a list again.
            Entry::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buf.push_str("\n\n");
                    }
                    self.write_alias(name, item);
                }
            }
            Entry::Leaf(value) => {
                self.buf.push_str(name);
                self.buf.push_str(" = ");
                self.buf.push_str(value);
            }
        }
    }

    fn write_children(&mut self, map: &EntryMap) {
        self.depth += 1;
        for (key, value) in map {
            self.write_part(key, value);
        }
        self.depth -= 1;
    }

    fn write_part(&mut self, key: &str, value: &Entry) {
        match value {
            Entry::Leaf(v) => {
                self.newline();
                self.buf.push('(');
                self.buf.push_str(key);
                self.buf.push_str(" = ");
                self.buf.push_str(v);
                self.buf.push(')');
            }
            Entry::Object(map) => self.write_block(key, map),
            Entry::List(items) => {
                for item in items {
                    match item {
                        Entry::Object(map) => self.write_block(key, map),
                        other => self.write_part(key, other),
                    }
                }
            }
        }
    }

    fn write_block(&mut self, key: &str, map: &EntryMap) {
        self.newline();
        self.buf.push('(');
        self.buf.push_str(key);
        self.buf.push_str(" =");
        self.write_children(map);
        self.newline();
        self.buf.push(')');
    }
}

/// Render one alias as TNS text.
pub fn entry_string(name: &str, entry: &Entry) -> String {
    let mut w = TnsWriter::new();
    w.write_alias(name, entry);
    w.buf
}

/// Render every alias in iteration order, each followed by a blank line.
pub fn entries_string<'a>(entries: impl IntoIterator<Item = (&'a String, &'a Entry)>) -> String {
    let mut out = String::new();
    for (name, entry) in entries {
        out.push_str(&entry_string(name, entry));
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_leaf() {
        assert_eq!(entry_string("X", &Entry::single("A", "1")), "X =\n    (A = 1)");
    }

    #[test]
    fn test_nested_and_list() {
        let mut address_a = EntryMap::new();
        address_a.insert("HOST".into(), "a".into());
        let mut address_b = EntryMap::new();
        address_b.insert("HOST".into(), "b".into());

        let mut list = EntryMap::new();
        list.insert(
            "ADDRESS".into(),
            Entry::List(vec![Entry::Object(address_a), Entry::Object(address_b)]),
        );
        let mut description = EntryMap::new();
        description.insert("ADDRESS_LIST".into(), Entry::Object(list));

        let expected = "\
X =
    (ADDRESS_LIST =
        (ADDRESS =
            (HOST = a)
        )
        (ADDRESS =
            (HOST = b)
        )
    )";
        assert_eq!(entry_string("X", &Entry::Object(description)), expected);
    }

    #[test]
    fn test_list_alias_repeats_name() {
        let entry = Entry::List(vec![Entry::single("A", "1"), Entry::single("A", "2")]);
        assert_eq!(
            entry_string("X", &entry),
            "X =\n    (A = 1)\n\nX =\n    (A = 2)"
        );
    }

    #[test]
    fn test_leaf_alias() {
        assert_eq!(entry_string("X", &Entry::from("1")), "X = 1");
    }
}
