// Table-start parsing: pulls the table name out of a CREATE TABLE line.
// The name is the third whitespace-separated token; nothing else on the line is read.

const NAME_QUOTES: [u8; 3] = [b'"', b'`', b'\''];

// Returns None when the line has fewer than three tokens or the name is empty
// once quotes are stripped. Non-UTF-8 bytes in the name are replaced, so such a
// table can never match the selection.
pub fn table_name(line: &[u8]) -> Option<String> {
    let token = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
        .nth(2)?;
    let start = token.iter().position(|b| !NAME_QUOTES.contains(b))?;
    let end = token.iter().rposition(|b| !NAME_QUOTES.contains(b))?;
    Some(String::from_utf8_lossy(&token[start..=end]).into_owned())
}
