use admin::Field;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Set { id: i64, field: Field, value: String },
    Add,
    Delete(i64),
    Save(i64),
    SaveAll,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("`{0}` needs an item id")]
    MissingId(&'static str),
    #[error("`{0}` is not an item id")]
    BadId(String),
}

pub const HELP: &str = "\
commands:
  list                 show the working copy
  name <id> <text>     rename an item
  buy <id> <price>     set the buy price (separators are ignored)
  sell <id> <price>    set the sell price
  add                  append a new item
  delete <id>          remove an item and save immediately
  save <id>            save (sends the whole list)
  save-all             save every item
  reset                discard local edits and reload
  quit                 leave";

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim_start();
    let (verb, rest) = split_word(line);
    match verb {
        "" => Err(ParseError::Empty),
        "list" | "ls" => Ok(Command::List),
        "add" => Ok(Command::Add),
        "save-all" => Ok(Command::SaveAll),
        "reset" => Ok(Command::Reset),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "delete" | "rm" => Ok(Command::Delete(parse_id("delete", rest)?.0)),
        "save" => Ok(Command::Save(parse_id("save", rest)?.0)),
        "name" => set(Field::Name, "name", rest),
        "buy" => set(Field::Buy, "buy", rest),
        "sell" => set(Field::Sell, "sell", rest),
        other => Err(ParseError::Unknown(other.to_string())),
    }
}

fn set(field: Field, verb: &'static str, rest: &str) -> Result<Command, ParseError> {
    let (id, value) = parse_id(verb, rest)?;
    Ok(Command::Set {
        id,
        field,
        value: value.trim_end().to_string(),
    })
}

fn parse_id<'a>(verb: &'static str, rest: &'a str) -> Result<(i64, &'a str), ParseError> {
    let (word, rest) = split_word(rest.trim_start());
    if word.is_empty() {
        return Err(ParseError::MissingId(verb));
    }
    let id = word
        .parse()
        .map_err(|_| ParseError::BadId(word.to_string()))?;
    Ok((id, rest))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text.trim_end(), ""),
    }
}
