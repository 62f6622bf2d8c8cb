use rusqlite::{ffi, params};
use std::collections::BTreeMap;
use vaulticon_core::db::{open_db_in_memory, DbError};
use vaulticon_core::{
    AttributeSource, Category, Combinator, Condition, ItemIndex, Operator, RepoError, RepoResult,
    Rule, RuleRepository, RuleService, RuleServiceError, RuleValidationError, RulingResolver,
    SettingsDocument, SqliteRuleRepository,
};

fn starred_rule(id: &str) -> Rule {
    Rule::with_id(id, Category::File, format!("rule {id}"))
        .icon("lucide-star")
        .condition(Condition::new(AttributeSource::Starred, Operator::Is, "true"))
}

#[test]
fn replace_and_load_preserve_order_and_conditions() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRuleRepository::new(&mut conn);

    let rules = vec![
        starred_rule("zeta"),
        Rule::with_id("alpha", Category::File, "Large PDFs")
            .color("#00ff00")
            .combinator(Combinator::Any)
            .condition(Condition::new(AttributeSource::Extension, Operator::Is, "pdf"))
            .condition(Condition::new(AttributeSource::Size, Operator::GreaterThan, "1000000"))
            .disabled(),
        starred_rule("mid"),
    ];
    repo.replace_rules(Category::File, &rules).unwrap();

    let loaded = repo.load_rules(Category::File).unwrap();
    assert_eq!(loaded, rules);
    assert!(repo.load_rules(Category::Tag).unwrap().is_empty());
}

#[test]
fn replace_rejects_duplicate_ids_and_keeps_previous_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRuleRepository::new(&mut conn);
    repo.replace_rules(Category::File, &[starred_rule("a")]).unwrap();

    let err = repo
        .replace_rules(Category::File, &[starred_rule("b"), starred_rule("b")])
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateRuleId { .. }));
    assert_eq!(repo.load_rules(Category::File).unwrap()[0].id, "a");
}

#[test]
fn unknown_persisted_operator_loads_and_never_matches() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteRuleRepository::new(&mut conn);
        repo.replace_rules(Category::File, &[starred_rule("legacy")])
            .unwrap();
    }
    conn.execute(
        "UPDATE rule_conditions SET operator = ?1 WHERE rule_id = ?2;",
        params!["isTruthy", "legacy"],
    )
    .unwrap();

    let mut service = RuleService::new(SqliteRuleRepository::new(&mut conn));
    assert_eq!(service.load_all(), 1);
    let rule = &service.rules(Category::File)[0];
    assert_eq!(
        rule.conditions[0].operator,
        Operator::Unknown("isTruthy".to_string())
    );

    let items: ItemIndex = [vaulticon_core::Item::file(vaulticon_core::FileDetails {
        path: "starred.md".to_string(),
        starred: true,
        ..Default::default()
    })]
    .into_iter()
    .collect();
    let resolver = RulingResolver::new(service.store(), &items);
    assert!(resolver.check_ruling(Category::File, "starred.md").is_none());
}

#[test]
fn invalid_combinator_loads_disabled_and_other_rules_survive() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteRuleRepository::new(&mut conn);
        repo.replace_rules(Category::File, &[starred_rule("good1"), starred_rule("good2")])
            .unwrap();
        repo.replace_rules(
            Category::Tag,
            &[Rule::with_id("bad", Category::Tag, "Nested").condition(Condition::new(
                AttributeSource::Depth,
                Operator::GreaterOrEqual,
                "1",
            ))],
        )
        .unwrap();
        repo.replace_rules(
            Category::Property,
            &[Rule::with_id("props", Category::Property, "Dates").condition(Condition::new(
                AttributeSource::PropertyType,
                Operator::Is,
                "date",
            ))],
        )
        .unwrap();
    }
    conn.execute("UPDATE rules SET combinator = 'xor' WHERE id = 'bad';", [])
        .unwrap();

    let mut service = RuleService::new(SqliteRuleRepository::new(&mut conn));
    assert_eq!(service.load_all(), 4);
    assert_eq!(service.rules(Category::File).len(), 2);
    assert_eq!(service.rules(Category::Property)[0].id, "props");

    let bad = &service.rules(Category::Tag)[0];
    assert_eq!(bad.id, "bad");
    assert!(!bad.enabled);

    let items: ItemIndex = [vaulticon_core::Item::tag(
        "area/work",
        vaulticon_core::TagDetails::default(),
    )]
    .into_iter()
    .collect();
    let resolver = RulingResolver::new(service.store(), &items);
    assert!(resolver.check_ruling(Category::Tag, "area/work").is_none());
}

#[test]
fn service_persists_only_on_change_and_survives_reload() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut service = RuleService::new(SqliteRuleRepository::new(&mut conn));
        assert!(service.save_rule(Category::File, starred_rule("a")).unwrap());
        assert!(service.save_rule(Category::File, starred_rule("b")).unwrap());
        assert!(!service.save_rule(Category::File, starred_rule("b")).unwrap());
        assert!(service.save_rule_at(Category::File, starred_rule("c"), 0).unwrap());
        assert!(service.reorder(Category::File, 2, 1).unwrap());
        assert!(service.delete_rule(Category::File, "a").unwrap());
        assert!(!service.delete_rule(Category::File, "a").unwrap());
        assert!(service.set_enabled(Category::File, "c", false).unwrap());
    }

    let mut reloaded = RuleService::new(SqliteRuleRepository::new(&mut conn));
    assert_eq!(reloaded.load_all(), 2);
    let rules = reloaded.rules(Category::File);
    let ids: Vec<&str> = rules.iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);
    assert!(!rules[0].enabled);
}

#[test]
fn service_rejects_invalid_rules_before_the_store() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = RuleService::new(SqliteRuleRepository::new(&mut conn));
    let rule = Rule::with_id("t", Category::Tag, "Tags").condition(Condition::new(
        AttributeSource::Tags,
        Operator::Contains,
        "x",
    ));

    let err = service.save_rule(Category::Tag, rule).unwrap_err();
    assert!(matches!(
        err,
        RuleServiceError::InvalidRule(RuleValidationError::SourceNotInCategory { .. })
    ));
    assert!(service.rules(Category::Tag).is_empty());
}

fn disk_full() -> RepoError {
    RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
        ffi::Error::new(ffi::SQLITE_FULL),
        Some("disk full".to_string()),
    )))
}

struct FailingRepo;

impl RuleRepository for FailingRepo {
    fn load_rules(&self, _category: Category) -> RepoResult<Vec<Rule>> {
        Ok(Vec::new())
    }

    fn replace_rules(&mut self, _category: Category, _rules: &[Rule]) -> RepoResult<()> {
        Err(disk_full())
    }

    fn replace_all(&mut self, _lists: &BTreeMap<Category, Vec<Rule>>) -> RepoResult<()> {
        Err(disk_full())
    }
}

#[test]
fn failed_write_rolls_back_the_store() {
    let mut service = RuleService::new(FailingRepo);
    let err = service.save_rule(Category::File, starred_rule("a")).unwrap_err();
    assert!(matches!(err, RuleServiceError::Repo(_)));
    assert!(service.rules(Category::File).is_empty());
}

/// Serves one category from memory and fails to read the others.
struct UnreadableRepo;

impl RuleRepository for UnreadableRepo {
    fn load_rules(&self, category: Category) -> RepoResult<Vec<Rule>> {
        match category {
            Category::Property => Ok(vec![Rule::with_id("p", Category::Property, "Props")]),
            _ => Err(disk_full()),
        }
    }

    fn replace_rules(&mut self, _category: Category, _rules: &[Rule]) -> RepoResult<()> {
        Ok(())
    }

    fn replace_all(&mut self, _lists: &BTreeMap<Category, Vec<Rule>>) -> RepoResult<()> {
        Ok(())
    }
}

#[test]
fn unreadable_category_does_not_block_the_others() {
    let mut service = RuleService::new(UnreadableRepo);
    assert_eq!(service.load_all(), 1);
    assert!(service.rules(Category::File).is_empty());
    assert_eq!(service.rules(Category::Property)[0].id, "p");
}

#[test]
fn import_replaces_all_categories_and_persists() {
    let mut conn = open_db_in_memory().unwrap();
    let json = r#"{
        "version": 1,
        "rules": {
            "tag": [
                { "id": "t1", "name": "Nested", "category": "tag", "icon": "layers",
                  "conditions": [{ "source": "depth", "operator": "greaterOrEqual", "value": "2" }] }
            ],
            "file": [
                { "id": "f2", "name": "Second", "category": "file" },
                { "id": "f1", "name": "First", "category": "file", "enabled": false }
            ]
        }
    }"#;
    let document = SettingsDocument::from_json(json).unwrap();

    {
        let mut service = RuleService::new(SqliteRuleRepository::new(&mut conn));
        service.save_rule(Category::Folder, Rule::with_id("old", Category::Folder, "Old")).unwrap();
        assert_eq!(service.import_settings(&document).unwrap(), 3);
        assert!(service.rules(Category::Folder).is_empty());
        assert_eq!(service.export_settings(), document);
    }

    let mut reloaded = RuleService::new(SqliteRuleRepository::new(&mut conn));
    assert_eq!(reloaded.load_all(), 3);
    assert_eq!(reloaded.rules(Category::File)[0].id, "f2");
    assert!(reloaded.rules(Category::Folder).is_empty());
}

fn two_category_document() -> SettingsDocument {
    SettingsDocument::from_json(
        r#"{
            "version": 1,
            "rules": {
                "file": [{ "id": "imported-file", "name": "Imported", "category": "file" }],
                "tag": [{ "id": "imported-tag", "name": "Imported", "category": "tag" }]
            }
        }"#,
    )
    .unwrap()
}

#[test]
fn import_failing_midway_leaves_database_and_store_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteRuleRepository::new(&mut conn);
        repo.replace_rules(Category::File, &[starred_rule("old-file")])
            .unwrap();
    }
    conn.execute_batch(
        "CREATE TRIGGER reject_tag_rules BEFORE INSERT ON rules
         WHEN NEW.category = 'tag'
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();

    {
        let mut service = RuleService::new(SqliteRuleRepository::new(&mut conn));
        assert_eq!(service.load_all(), 1);
        let err = service.import_settings(&two_category_document()).unwrap_err();
        assert!(matches!(err, RuleServiceError::Repo(RepoError::Db(_))));
        assert_eq!(service.rules(Category::File)[0].id, "old-file");
        assert!(service.rules(Category::Tag).is_empty());
    }

    let repo = SqliteRuleRepository::new(&mut conn);
    let files = repo.load_rules(Category::File).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, "old-file");
    assert!(repo.load_rules(Category::Tag).unwrap().is_empty());
}

#[test]
fn failed_import_keeps_the_previous_store() {
    let mut service = RuleService::new(FailingRepo);
    let err = service.import_settings(&two_category_document()).unwrap_err();
    assert!(matches!(err, RuleServiceError::Repo(_)));
    assert!(service.rules(Category::File).is_empty());
    assert!(service.rules(Category::Tag).is_empty());
}

#[test]
fn replace_all_rejects_duplicates_before_writing_anything() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRuleRepository::new(&mut conn);
    repo.replace_rules(Category::File, &[starred_rule("a")]).unwrap();

    let mut lists = BTreeMap::new();
    lists.insert(Category::File, vec![starred_rule("b")]);
    lists.insert(
        Category::Folder,
        vec![
            Rule::with_id("dup", Category::Folder, "One"),
            Rule::with_id("dup", Category::Folder, "Two"),
        ],
    );
    let err = repo.replace_all(&lists).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateRuleId { category: Category::Folder, .. }));
    assert_eq!(repo.load_rules(Category::File).unwrap()[0].id, "a");
}
