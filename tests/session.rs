use gambit_pack::{
    ActionCatalog, Condition, Edit, EditError, EditOutcome, EditingSession, EditorSurface,
    LineEnding, LoopCount, PackValue, SessionError, TextFile,
};
use pretty_assertions::assert_eq;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const PACK: &str = "{\r\n  \"golem\": {\r\n    \"Stone\": {\r\n      \"gambitPack\": {\r\n        \"timeLines\": [\r\n          {\r\n            \"condition\": \"Self\",\r\n            \"actionId\": 12,\r\n            \"timing\": 0,\r\n            \"description\": \"Attack\",\r\n            \"actionParam\": 0\r\n          }\r\n        ]\r\n      }\r\n    }\r\n  }\r\n}\r\n";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> ActionCatalog {
    ActionCatalog::from_pairs([(12, "Attack"), (30, "Fireball")])
}

#[test]
fn edits_undo_and_redo_through_the_host() -> Result<()> {
    init_logging();
    let mut host = String::from(PACK);
    let mut session = EditingSession::new(catalog());
    assert!(session.load(&host)?.is_empty());

    let doc = session.document().ok_or("no document")?;
    let stone = doc.monster_id("Stone").ok_or("Stone missing")?;
    let rule = doc.rule_handles(stone)[0];

    session.apply(&mut host, Edit::SetAction { rule, action_id: 30 })?;
    session.apply(
        &mut host,
        Edit::SetCondition {
            rule,
            condition: Condition::HpBelowThreshold,
            threshold: Some(25),
        },
    )?;
    let edited = host.clone();
    assert!(edited.contains("\"HPSelfPctLessThanTarget\""));
    assert!(edited.contains("\"Fireball\""));
    assert!(!edited.replace("\r\n", "").contains('\n'));
    assert_eq!(
        session.changes().collect::<Vec<_>>(),
        [
            "Stone rule #1: action = 30",
            "Stone rule #1: condition = HP < X%"
        ]
    );

    assert_eq!(session.undo(&mut host)?, "Stone rule #1: condition = HP < X%");
    session.undo(&mut host)?;
    assert_eq!(host, PACK);
    assert!(matches!(
        session.undo(&mut host),
        Err(SessionError::Edit(EditError::NothingToUndo))
    ));

    session.redo(&mut host)?;
    session.redo(&mut host)?;
    assert_eq!(host, edited);
    assert!(!session.can_redo());
    Ok(())
}

#[test]
fn new_edit_clears_redo() -> Result<()> {
    let mut host = String::from(PACK);
    let mut session = EditingSession::new(catalog());
    session.load(&host)?;
    let doc = session.document().ok_or("no document")?;
    let stone = doc.monster_id("Stone").ok_or("Stone missing")?;

    let applied = session.apply(&mut host, Edit::AddRule(stone))?;
    let EditOutcome::Added(added) = applied.outcome else {
        return Err("expected an added rule".into());
    };
    session.undo(&mut host)?;
    assert!(session.can_redo());
    assert!(session.document().and_then(|d| d.rule(added)).is_none());

    session.apply(
        &mut host,
        Edit::SetLoopCount {
            monster: stone,
            loop_count: LoopCount::Infinite,
        },
    )?;
    assert!(!session.can_redo());
    let root = PackValue::parse(&host)?;
    let lc = root
        .get("golem")
        .and_then(|g| g.get("Stone"))
        .and_then(|s| s.get("gambitPack"))
        .and_then(|p| p.get("loopCount"))
        .and_then(|v| v.as_i64());
    assert_eq!(lc, Some(-1));
    Ok(())
}

#[test]
fn file_host_keeps_crlf_after_edit() -> Result<()> {
    init_logging();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("golem.json");
    std::fs::write(&path, PACK)?;

    let mut file = TextFile::load_path(&path)?;
    assert_eq!(file.line_ending, LineEnding::CrLf);
    assert_eq!(file.text(), PACK);

    let mut session = EditingSession::new(catalog());
    session.load(&file)?;
    let doc = session.document().ok_or("no document")?;
    let rule = doc.rule_handles(doc.monster_id("Stone").ok_or("Stone missing")?)[0];
    session.apply(&mut file, Edit::ToggleEnabled(rule))?;
    assert!(file.is_dirty());

    file.save_to_path(&path)?;
    assert!(!file.is_dirty());

    let text = std::fs::read_to_string(&path)?;
    assert_eq!(text, file.current_text());
    assert!(text.ends_with("}\r\n"));
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            assert_eq!(text.as_bytes()[i - 1], b'\r', "bare LF at {i}");
        }
    }
    assert!(text.contains("\"originalCondition\": \"Self\""));
    Ok(())
}

#[test]
fn unmodified_file_saves_identical_bytes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("golem.json");
    std::fs::write(&path, PACK)?;

    let mut file = TextFile::load_path(&path)?;
    let mut session = EditingSession::new(catalog());
    session.load(&file)?;
    session.synchronize(&mut file)?;
    assert!(!file.is_dirty());

    let out = dir.path().join("copy.json");
    file.save_to_path(&out)?;
    assert_eq!(std::fs::read(&out)?, PACK.as_bytes());
    Ok(())
}
