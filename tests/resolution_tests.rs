//! Arborist Integration Tests
//!
//! End-to-end resolution through [`ContentResolver`] against an in-memory
//! content tree with call counting:
//! - Settings inheritance and caching
//! - Translation lookup order and folder TTLs
//! - Option codes and faults
//! - Titles and navigation

use std::sync::Arc;
use std::time::Duration;

use arborist::adapters::{
    InMemoryContentTree, InMemoryOptionCatalog, StaticConfigSource, StaticLocaleSource,
};
use arborist::cache::{ManualClock, ResolverCaches};
use arborist::{ContentResolver, LanguageCode, NodeId};

// Site(1)
// ├── Settings(2, defaultCacheDuration 120)
// │   └── Title(3) = "Acme"
// ├── Home_TranslationFolder(4)
// │   ├── Translation(5, es)
// │   └── Translation(6, es-MX)
// ├── Section(10)           pageTitleTemplate "{page} | {parent-title}"
// │   ├── Settings(11)
// │   │   └── MaxItems(12) = "10"
// │   └── Article(20)        no container, no folder
// │       └── Gallery(21)
// └── Listing(30)            colours "3, 7,12", tags "red,blue", related "[20, 99, 10]"
const SITE: &str = r#"
roots:
  - id: 1
    type: Home
    name: Acme
    properties:
      heading: Welcome
      intro: Hello
      intro_fr: Bonjour
      pageTitle: Acme Home
    children:
      - id: 2
        type: Settings
        name: Settings
        properties:
          defaultCacheDuration: 120
        children:
          - id: 3
            type: Setting
            name: Title
            properties:
              value: Acme
      - id: 4
        type: Home_TranslationFolder
        name: Translations
        children:
          - id: 5
            type: Translation
            name: Spanish
            properties:
              language: es
              heading: Bienvenido
          - id: 6
            type: Translation
            name: Mexican Spanish
            properties:
              language: es-MX
              heading: Bienvenidos, compas
      - id: 10
        type: Section
        name: News
        properties:
          pageTitleTemplate: "{page} | {parent-title}"
        children:
          - id: 11
            type: Settings
            name: Settings
            children:
              - id: 12
                type: Setting
                name: MaxItems
                properties:
                  value: "10"
          - id: 20
            type: Article
            name: Launch Day
            children:
              - id: 21
                type: Gallery
                name: Photos
      - id: 30
        type: Listing
        name: Products
        properties:
          colours: "3, 7,12"
          tags: "red,blue"
          related: "[20, 99, 10]"
          size: 7
"#;

const CATALOG: &str = r#"
types:
  - name: Colours
    id: 100
    options:
      3: Red
      7: Green
      12: Blue
"#;

struct Site {
    resolver: ContentResolver,
    tree: Arc<InMemoryContentTree>,
    catalog: Arc<InMemoryOptionCatalog>,
    config: Arc<StaticConfigSource>,
    locale: Arc<StaticLocaleSource>,
    clock: Arc<ManualClock>,
}

fn site() -> Site {
    let tree = Arc::new(InMemoryContentTree::from_yaml_str(SITE).unwrap());
    let catalog = Arc::new(InMemoryOptionCatalog::from_yaml_str(CATALOG).unwrap());
    let config = Arc::new(StaticConfigSource::new());
    let locale = Arc::new(StaticLocaleSource::new(["en-US", "es-MX"]));
    let clock = Arc::new(ManualClock::default());

    let resolver = ContentResolver::builder(tree.clone())
        .with_option_lookup(catalog.clone())
        .with_config_source(config.clone())
        .with_locale_source(locale.clone())
        .with_caches(Arc::new(ResolverCaches::new(clock.clone())))
        .build();

    Site {
        resolver,
        tree,
        catalog,
        config,
        locale,
        clock,
    }
}

// =============================================================================
// Settings Resolution Tests
// =============================================================================

mod settings_tests {
    use super::*;

    #[test]
    fn test_setting_from_parent_container() {
        let site = site();
        let max_items: i64 = site.resolver.setting(NodeId(20), "MaxItems");
        assert_eq!(max_items, 10);

        let location = site.resolver.caches().settings_location();
        assert_eq!(location.peek(&NodeId(20)).unwrap().value().container, NodeId(11));
        assert_eq!(location.peek(&NodeId(10)).unwrap().value().container, NodeId(11));
    }

    #[test]
    fn test_repeat_lookup_makes_no_scan() {
        let site = site();
        let first: i64 = site.resolver.setting(NodeId(21), "MaxItems");
        let before = site.tree.access_stats();

        for _ in 0..5 {
            let again: i64 = site.resolver.setting(NodeId(21), "MaxItems");
            assert_eq!(again, first);
        }
        assert_eq!(site.tree.access_stats().scans(), before.scans());
    }

    #[test]
    fn test_missing_setting_caches_every_visited_container() {
        let site = site();
        let value: String = site.resolver.setting(NodeId(20), "NotThere");
        assert_eq!(value, "");

        let caches = site.resolver.caches();
        for node in [20, 10, 1] {
            assert!(caches.settings_location().contains_key(&NodeId(node)));
        }
        assert_eq!(caches.counters().negative_entries(), 2);

        let before = site.tree.access_stats();
        let again: String = site.resolver.setting(NodeId(20), "NotThere");
        assert_eq!(again, "");
        assert_eq!(site.tree.access_stats().scans(), before.scans());
    }

    #[test]
    fn test_outer_setting_inherited_through_inner_container() {
        let site = site();
        let title: String = site.resolver.setting(NodeId(20), "title");
        assert_eq!(title, "Acme");
    }

    #[test]
    fn test_container_ttl_governs_refresh() {
        let site = site();
        let title: String = site.resolver.setting(NodeId(1), "Title");
        assert_eq!(title, "Acme");

        site.tree
            .set_property(NodeId(3), "value", serde_json::json!("Acme Ltd"))
            .unwrap();

        site.clock.advance(Duration::from_secs(120));
        let cached: String = site.resolver.setting(NodeId(1), "Title");
        assert_eq!(cached, "Acme");

        site.clock.advance(Duration::from_secs(1));
        let refreshed: String = site.resolver.setting(NodeId(1), "Title");
        assert_eq!(refreshed, "Acme Ltd");
    }

    #[test]
    fn test_lookup_never_mutates_tree() {
        let site = site();
        let before = site.tree.len();
        let _: i64 = site.resolver.setting(NodeId(21), "MaxItems");
        let _: String = site.resolver.setting(NodeId(21), "Missing");
        assert_eq!(site.tree.len(), before);
    }
}

// =============================================================================
// Translation Tests
// =============================================================================

mod translation_tests {
    use super::*;

    #[test]
    fn test_regional_translation_preferred() {
        let site = site();
        site.locale.set_hint(Some("es-MX".to_string()));
        let heading: String = site.resolver.localized(NodeId(1), "heading", false);
        assert_eq!(heading, "Bienvenidos, compas");
    }

    #[test]
    fn test_language_translation_used_when_no_regional_entry() {
        let site = site();
        site.tree.remove_node(NodeId(6)).unwrap();
        site.locale.set_hint(Some("es-MX".to_string()));
        let heading: String = site.resolver.localized(NodeId(1), "heading", false);
        assert_eq!(heading, "Bienvenido");
    }

    #[test]
    fn test_default_language_reads_base_value() {
        let site = site();
        let heading: String = site.resolver.localized(NodeId(1), "heading", false);
        assert_eq!(site.resolver.active_locale(), LanguageCode::from("en"));
        assert_eq!(heading, "Welcome");
    }

    #[test]
    fn test_recursive_lookup_reaches_root() {
        let site = site();
        let heading: String = site
            .resolver
            .localized_in(NodeId(21), "intro", true, &LanguageCode::from("fr"));
        assert_eq!(heading, "Bonjour");
    }

    #[test]
    fn test_bypass_returns_base_value() {
        let site = site();
        site.config.set("bypass_localization", "true");
        site.locale.set_hint(Some("es-MX".to_string()));
        let heading: String = site.resolver.localized(NodeId(1), "heading", false);
        assert_eq!(heading, "Welcome");
    }

    #[test]
    fn test_folder_hit_valid_until_ttl() {
        let site = site();
        let translations = site.resolver.translations();
        assert_eq!(translations.translation_folder(NodeId(1)), Some(NodeId(4)));
        let scans = site.tree.access_stats().children_calls;

        site.clock.advance(Duration::from_secs(299));
        assert_eq!(translations.translation_folder(NodeId(1)), Some(NodeId(4)));
        assert_eq!(site.tree.access_stats().children_calls, scans);

        site.clock.advance(Duration::from_secs(2));
        assert_eq!(translations.translation_folder(NodeId(1)), Some(NodeId(4)));
        assert_eq!(site.tree.access_stats().children_calls, scans + 1);
    }

    #[test]
    fn test_folder_miss_rescanned_after_a_minute() {
        let site = site();
        let translations = site.resolver.translations();
        assert_eq!(translations.translation_folder(NodeId(20)), None);
        let scans = site.tree.access_stats().children_calls;

        site.clock.advance(Duration::from_secs(61));
        assert_eq!(translations.translation_folder(NodeId(20)), None);
        assert_eq!(site.tree.access_stats().children_calls, scans + 1);
    }
}

// =============================================================================
// Locale Tests
// =============================================================================

mod locale_tests {
    use super::*;
    use arborist::error::{Error, Result};
    use arborist::ConfigSource;

    struct FailingConfig;

    impl ConfigSource for FailingConfig {
        fn get_bool(&self, key: &str) -> Result<bool> {
            Err(Error::ConfigurationUnavailable {
                key: key.to_string(),
                reason: "store offline".to_string(),
            })
        }

        fn get_string(&self, key: &str) -> Result<Option<String>> {
            Err(Error::ConfigurationUnavailable {
                key: key.to_string(),
                reason: "store offline".to_string(),
            })
        }
    }

    #[test]
    fn test_configuration_fault_uses_first_language() {
        let tree = Arc::new(InMemoryContentTree::from_yaml_str(SITE).unwrap());
        let resolver = ContentResolver::builder(tree)
            .with_config_source(Arc::new(FailingConfig))
            .with_locale_source(Arc::new(StaticLocaleSource::new(["de-DE", "en-US"])))
            .build();

        assert_eq!(resolver.active_locale(), LanguageCode::from("de"));
        let heading: String = resolver.localized(NodeId(1), "heading", false);
        assert_eq!(heading, "Welcome");
    }

    #[test]
    fn test_configured_default_language() {
        let site = site();
        site.config.set("default_language", "es-MX");
        assert_eq!(site.resolver.active_locale(), LanguageCode::from("es-MX"));
    }

    #[test]
    fn test_available_languages_deduplicated() {
        let site = site();
        site.locale.set_hint(None);
        assert_eq!(
            site.resolver.available_languages(),
            vec![LanguageCode::from("en"), LanguageCode::from("es")]
        );
    }
}

// =============================================================================
// Option Tests
// =============================================================================

mod option_tests {
    use super::*;

    #[test]
    fn test_code_list_resolved_in_order() {
        let site = site();
        assert_eq!(
            site.resolver.resolve_option_list("3, 7,12"),
            vec!["Red", "Green", "Blue"]
        );
        assert_eq!(site.resolver.resolve_option_list("red,blue"), vec!["red", "blue"]);
    }

    #[test]
    fn test_drop_downs() {
        let site = site();
        assert_eq!(
            site.resolver.drop_down_values(NodeId(30), "colours", false),
            vec!["Red", "Green", "Blue"]
        );
        assert_eq!(
            site.resolver.drop_down_values(NodeId(30), "tags", false),
            vec!["red", "blue"]
        );
        assert_eq!(
            site.resolver.drop_down_value(NodeId(30), "size", false),
            Some("Green".to_string())
        );
        assert_eq!(site.resolver.drop_down_value(NodeId(20), "size", false), None);
    }

    #[test]
    fn test_spurious_fault_returns_code_then_recovers() {
        let site = site();
        site.catalog.inject_spurious_faults(7, 1);

        assert_eq!(site.resolver.resolve_option("7"), "7");
        assert_eq!(site.resolver.stats().swallowed_faults, 1);
        assert_eq!(site.resolver.resolve_option("7"), "Green");
        assert_eq!(site.resolver.resolve_option("7"), "Green");
        assert_eq!(site.catalog.display_calls(), 2);
    }

    #[test]
    fn test_option_type_values() {
        let site = site();
        assert_eq!(site.resolver.option_type_id("colours"), Some(100));
        assert_eq!(
            site.resolver.option_values_for_type("Colours"),
            vec!["Red", "Green", "Blue"]
        );
    }
}

// =============================================================================
// Picked Node, Title And Navigation Tests
// =============================================================================

mod content_tests {
    use super::*;
    use arborist::navigation;

    #[test]
    fn test_picked_ids_from_json_text() {
        let site = site();
        assert_eq!(
            site.resolver.picked_node_ids(NodeId(30), "related", false),
            vec![NodeId(20), NodeId(99), NodeId(10)]
        );
        assert_eq!(
            site.resolver.picked_node(NodeId(30), "related", false),
            Some(NodeId(20))
        );
        assert_eq!(
            site.resolver.picked_nodes(NodeId(30), "related", false),
            vec![NodeId(20), NodeId(10)]
        );
        assert!(site
            .resolver
            .picked_node_ids(NodeId(21), "related", true)
            .is_empty());
    }

    #[test]
    fn test_browser_title_tokens() {
        let site = site();
        assert_eq!(site.resolver.browser_title(NodeId(1)), "Acme Home");
        assert_eq!(site.resolver.browser_title(NodeId(20)), "Launch Day | News");
        assert_eq!(site.resolver.browser_title(NodeId(999)), "");
    }

    #[test]
    fn test_title_falls_back_to_name() {
        let site = site();
        assert_eq!(site.resolver.title(NodeId(21)), "Photos");
    }

    #[test]
    fn test_navigation_in_tree_order() {
        let site = site();
        let tree = site.resolver.tree();
        assert_eq!(
            navigation::descendants_of_types(tree, NodeId(1), &["Settings"]),
            vec![NodeId(2), NodeId(11)]
        );
        assert_eq!(
            navigation::siblings_of_types(tree, NodeId(10), &["Listing", "Settings"]),
            vec![NodeId(2), NodeId(30)]
        );
        assert_eq!(
            navigation::nearest_ancestor_of_type(tree, NodeId(21), "section", false),
            Some(NodeId(10))
        );
    }

    #[test]
    fn test_stats_serialize() {
        let site = site();
        let _: i64 = site.resolver.setting(NodeId(20), "MaxItems");
        let stats = serde_json::to_value(site.resolver.stats()).unwrap();
        assert_eq!(stats["backfilled_nodes"], 2);
    }
}

// =============================================================================
// Concurrency Tests
// =============================================================================

mod concurrency_tests {
    use super::*;
    use std::thread;

    const WORKERS: usize = 8;
    const ROUNDS: usize = 50;

    #[derive(Debug, Clone, PartialEq)]
    struct Answers {
        max_items: i64,
        title: String,
        heading: String,
        colours: Vec<String>,
    }

    fn answer(resolver: &ContentResolver, es_mx: &LanguageCode) -> Answers {
        Answers {
            max_items: resolver.setting(NodeId(21), "MaxItems"),
            title: resolver.setting(NodeId(20), "Title"),
            heading: resolver.localized_in(NodeId(1), "heading", false, es_mx),
            colours: resolver.resolve_option_list("3, 7,12"),
        }
    }

    #[test]
    fn test_shared_resolver_across_threads() {
        let site = site();
        let es_mx = LanguageCode::from("es-MX");
        let expected = Answers {
            max_items: 10,
            title: "Acme".to_string(),
            heading: "Bienvenidos, compas".to_string(),
            colours: vec!["Red".to_string(), "Green".to_string(), "Blue".to_string()],
        };

        let results: Vec<Vec<Answers>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..WORKERS)
                .map(|_| {
                    let resolver = &site.resolver;
                    let es_mx = &es_mx;
                    scope.spawn(move || {
                        (0..ROUNDS)
                            .map(|_| answer(resolver, es_mx))
                            .collect::<Vec<Answers>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for worker in &results {
            assert_eq!(worker.len(), ROUNDS);
            for answers in worker {
                assert_eq!(answers, &expected);
            }
        }

        // 21, 20 and 10 map to container 11; 1 maps to container 2
        let caches = site.resolver.caches();
        assert_eq!(caches.settings_location().len(), 4);
        // MaxItems at 11, Title at 11 and 2
        assert_eq!(caches.settings_value().len(), 3);

        let stats = site.resolver.stats();
        assert_eq!(stats.options.entries, 3);
        assert_eq!(stats.swallowed_faults, 0);
        let lookups = stats.settings_value.hits + stats.settings_value.misses + stats.settings_value.expired;
        assert!(lookups >= (WORKERS * ROUNDS * 2) as u64);
        assert!(site.catalog.display_calls() >= 3);
        assert!(site.catalog.display_calls() <= (3 * WORKERS) as u64);
    }

    #[test]
    fn test_threads_agree_after_expiry() {
        let site = site();
        let _: String = site.resolver.setting(NodeId(20), "Title");
        site.tree
            .set_property(NodeId(3), "value", serde_json::json!("Acme Ltd"))
            .unwrap();
        site.clock.advance(Duration::from_secs(121));

        let titles: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..WORKERS)
                .map(|_| {
                    let resolver = &site.resolver;
                    scope.spawn(move || resolver.setting::<String>(NodeId(20), "Title"))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(titles.iter().all(|title| title == "Acme Ltd"));
        let cached: String = site.resolver.setting(NodeId(1), "Title");
        assert_eq!(cached, "Acme Ltd");
    }

    #[test]
    fn test_default_language_memoized_once_across_threads() {
        let site = site();
        let locales: Vec<LanguageCode> = thread::scope(|scope| {
            let handles: Vec<_> = (0..WORKERS)
                .map(|_| {
                    let resolver = &site.resolver;
                    scope.spawn(move || resolver.active_locale())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(locales.iter().all(|locale| locale == &LanguageCode::from("en")));
    }
}
