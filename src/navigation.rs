use tower_lsp::lsp_types::{Location, Position, Url};

use crate::language::Model;
use crate::line_index::LineIndex;

pub fn goto_definition(
    uri: &Url,
    line_index: &LineIndex,
    position: Position,
    model: &Model,
) -> Option<Location> {
    let offset = line_index.offset_of(position)?;
    let occ = model.symbol_at_offset(offset)?;
    let def = if occ.is_definition {
        occ.name
    } else {
        model.definition(occ.kind, &occ.name.text)?
    };
    Some(Location::new(uri.clone(), line_index.range_of(def.range)))
}

pub fn find_references(
    uri: &Url,
    line_index: &LineIndex,
    position: Position,
    model: &Model,
    include_declaration: bool,
) -> Vec<Location> {
    let Some(offset) = line_index.offset_of(position) else {
        return Vec::new();
    };
    let Some(occ) = model.symbol_at_offset(offset) else {
        return Vec::new();
    };

    let mut locations: Vec<Location> = model
        .references(occ.kind, &occ.name.text)
        .into_iter()
        .map(|name| Location::new(uri.clone(), line_index.range_of(name.range)))
        .collect();

    if include_declaration {
        if let Some(def) = model.definition(occ.kind, &occ.name.text) {
            locations.push(Location::new(uri.clone(), line_index.range_of(def.range)));
        }
    }

    locations.sort_by(|a, b| {
        a.uri
            .as_str()
            .cmp(b.uri.as_str())
            .then_with(|| position_key(a).cmp(&position_key(b)))
    });
    locations.dedup_by(|a, b| a.uri == b.uri && a.range == b.range);
    locations
}

fn position_key(loc: &Location) -> (u32, u32, u32, u32) {
    (
        loc.range.start.line,
        loc.range.start.character,
        loc.range.end.line,
        loc.range.end.character,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{GrammarParser, Parser};

    const SOURCE: &str = r#"machine Door
state Closed initial
state Open
transition open from Closed to Open
transition close from Open to Closed
"#;

    fn setup() -> (Url, LineIndex, Model) {
        (
            Url::parse("file:///door.fsm").unwrap(),
            LineIndex::new(SOURCE),
            GrammarParser.parse(SOURCE).unwrap(),
        )
    }

    #[test]
    fn goto_definition_from_transition_endpoint() {
        let (uri, line_index, model) = setup();
        let offset = SOURCE.rfind("Closed").unwrap() + 2;
        let loc = goto_definition(&uri, &line_index, line_index.position_of(offset), &model)
            .expect("definition");

        let def_offset = SOURCE.find("Closed").unwrap();
        assert_eq!(loc.range.start, line_index.position_of(def_offset));
    }

    #[test]
    fn find_references_includes_both_endpoints() {
        let (uri, line_index, model) = setup();
        let offset = SOURCE.find("Open").unwrap() + 1;
        let position = line_index.position_of(offset);

        let refs = find_references(&uri, &line_index, position, &model, false);
        assert_eq!(refs.len(), 2);

        let with_decl = find_references(&uri, &line_index, position, &model, true);
        assert_eq!(with_decl.len(), 3);
        assert_eq!(
            with_decl[0].range.start,
            line_index.position_of(offset - 1),
            "declaration sorts first"
        );
    }

    #[test]
    fn undefined_reference_has_no_definition() {
        let source = "state A initial\ntransition t from A to Ghost";
        let model = GrammarParser.parse(source).unwrap();
        let line_index = LineIndex::new(source);
        let uri = Url::parse("file:///ghost.fsm").unwrap();
        let offset = source.find("Ghost").unwrap();
        assert!(goto_definition(&uri, &line_index, line_index.position_of(offset), &model).is_none());
    }
}
