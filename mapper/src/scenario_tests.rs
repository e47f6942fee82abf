//! End-to-end mapping scenarios, run under both execution modes

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::test_support::{init_test_tracing, list, string};
use crate::{
    ExecutionMode, FieldDescriptor, FieldType, Mappable, Mapper, MapperConfig,
    MappingConfigurator, TypeDescriptor, TypeName, Value,
};

const MODES: [ExecutionMode; 2] = [ExecutionMode::Interpreted, ExecutionMode::Compiled];

fn mapper(execution: ExecutionMode) -> Mapper {
    init_test_tracing();
    Mapper::with_config(MapperConfig::default().with_execution(execution)).unwrap()
}

fn name_of<T: Mappable>() -> TypeName {
    T::descriptor().unwrap().name().clone()
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Customer {
    name:   String,
    age:    i32,
    email:  String,
    active: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct CustomerSummary {
    name:   String,
    age:    i64,
    active: bool,
}

#[test]
fn same_named_scalars_are_copied() {
    let source = Customer {
        name:   "Ned".into(),
        age:    60,
        email:  "ned@example.com".into(),
        active: true,
    };
    for mode in MODES {
        let summary: CustomerSummary = mapper(mode).map(&source).unwrap();
        assert_eq!(
            summary,
            CustomerSummary {
                name:   "Ned".into(),
                age:    60,
                active: true,
            },
            "{mode}"
        );
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Letters {
    x: Option<String>,
    b: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Bound {
    #[bind_to("X")]
    b: String,
}

#[test]
fn first_non_null_candidate_wins() {
    let both = Letters {
        x: Some("FallbackValue".into()),
        b: "Beta".into(),
    };
    let only_b = Letters {
        x: None,
        b: "Beta".into(),
    };
    for mode in MODES {
        let mapper = mapper(mode);
        let bound: Bound = mapper.map(&both).unwrap();
        assert_eq!(bound.b, "FallbackValue", "{mode}");

        let bound: Bound = mapper.map(&only_b).unwrap();
        assert_eq!(bound.b, "Beta", "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Address {
    street: String,
    city:   String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Household {
    name:      String,
    size:      u8,
    home:      Address,
    cottage:   Option<Address>,
    residents: Vec<String>,
}

#[test]
fn flatten_then_rehydrate_reproduces_the_graph() {
    let household = Household {
        name:      "Simpson".into(),
        size:      5,
        home:      Address {
            street: "742 Evergreen Terrace".into(),
            city:   "Springfield".into(),
        },
        cottage:   None,
        residents: vec!["Homer".into(), "Marge".into(), "Bart".into()],
    };
    let mapper = mapper(ExecutionMode::Interpreted);

    let flattened = mapper.flatten_typed(&household);
    assert_eq!(
        flattened.value("Home.City"),
        Some(&Value::from("Springfield"))
    );
    assert_eq!(flattened.value("Residents[2]"), Some(&Value::from("Bart")));

    let rehydrated: Household = mapper.rehydrate_typed(&flattened).unwrap();
    assert_eq!(rehydrated, household);
}

#[test]
fn cyclic_sources_terminate() {
    for mode in MODES {
        let mapper = mapper(mode);
        for name in ["Node", "NodeDto"] {
            mapper.register(
                TypeDescriptor::structure(name)
                    .field(FieldDescriptor::new("Name", string()))
                    .field(FieldDescriptor::new(
                        "Child",
                        FieldType::nullable(FieldType::object(name)),
                    ))
                    .build(),
            );
        }
        let a = mapper
            .registry()
            .instantiate(&TypeName::from("Node"))
            .unwrap();
        let b = mapper
            .registry()
            .instantiate(&TypeName::from("Node"))
            .unwrap();
        a.set_by_name("Name", Value::from("a"));
        b.set_by_name("Name", Value::from("b"));
        a.set_by_name("Child", Value::Object(b.clone()));
        b.set_by_name("Child", Value::Object(a.clone()));

        let mapped = mapper
            .map_value(&Value::Object(a), &TypeName::from("NodeDto"))
            .unwrap();

        let mapped = mapped.as_object().unwrap();
        assert_eq!(mapped.get_by_name("Name").unwrap(), Value::from("a"), "{mode}");
        let child = mapped.get_by_name("Child").unwrap();
        let child = child.as_object().unwrap();
        assert_eq!(child.get_by_name("Name").unwrap(), Value::from("b"), "{mode}");
        assert!(child.get_by_name("Child").unwrap().is_null(), "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct LineItem {
    sku:      String,
    quantity: u32,
    note:     String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct LineItemDto {
    sku:      String,
    quantity: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Order {
    items: Vec<LineItem>,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct OrderDto {
    items: Vec<LineItemDto>,
}

#[test]
fn collections_map_element_by_element() {
    let order = Order {
        items: vec![
            LineItem {
                sku:      "duff".into(),
                quantity: 6,
                note:     "cold".into(),
            },
            LineItem {
                sku:      "donut".into(),
                quantity: 12,
                note:     String::new(),
            },
        ],
    };
    for mode in MODES {
        let mapper = mapper(mode);
        let dto: OrderDto = mapper.map(&order).unwrap();
        assert_eq!(
            dto.items,
            [
                LineItemDto {
                    sku:      "duff".into(),
                    quantity: 6,
                },
                LineItemDto {
                    sku:      "donut".into(),
                    quantity: 12,
                },
            ],
            "{mode}"
        );

        let empty: OrderDto = mapper.map(&Order::default()).unwrap();
        assert!(empty.items.is_empty(), "{mode}");
    }
}

#[test]
fn empty_lists_map_to_empty_arrays() {
    for mode in MODES {
        let mapper = mapper(mode);
        mapper.register(
            TypeDescriptor::structure("Bag")
                .field(FieldDescriptor::new("Items", FieldType::list(string())))
                .build(),
        );
        mapper.register(
            TypeDescriptor::structure("Crate")
                .field(FieldDescriptor::new("Items", FieldType::array(string())))
                .build(),
        );
        let bag = mapper
            .registry()
            .instantiate(&TypeName::from("Bag"))
            .unwrap();
        bag.set_by_name("Items", list(Vec::new()));
        let target = mapper
            .registry()
            .instantiate(&TypeName::from("Crate"))
            .unwrap();
        target.set_by_name("Items", Value::Null);

        mapper
            .bind_value(&Value::Object(target.clone()), &Value::Object(bag))
            .unwrap();

        let items = target.get_by_name("Items").unwrap();
        assert!(matches!(&items, Value::Array(array) if array.is_empty()), "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Inner {
    info: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Outer {
    nested: Inner,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Details {
    info: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Flattened {
    #[complex_bind(dest = "NestedDestination.Info", source = "Nested.Info")]
    label:              String,
    nested_destination: Option<Details>,
}

#[test]
fn complex_binds_construct_missing_intermediates() {
    let outer = Outer {
        nested: Inner {
            info: "deep".into(),
        },
    };
    for mode in MODES {
        let flattened: Flattened = mapper(mode).map(&outer).unwrap();
        assert_eq!(
            flattened.nested_destination,
            Some(Details {
                info: "deep".into(),
            }),
            "{mode}"
        );
        assert!(flattened.label.is_empty(), "{mode}");
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Mappable)]
enum Level {
    #[default]
    Value1,
    Value2,
    Value3,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Reading {
    level: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Gauge {
    level: Level,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Mappable)]
enum Grade {
    #[default]
    Value1,
    Value2,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Graded {
    level: Grade,
}

#[test]
fn enums_match_by_name() {
    for mode in MODES {
        let mapper = mapper(mode);

        let gauge: Gauge = mapper
            .map(&Reading {
                level: "Value2".into(),
            })
            .unwrap();
        assert_eq!(gauge.level, Level::Value2, "{mode}");

        let gauge: Gauge = mapper
            .map(&Reading {
                level: "Unknown".into(),
            })
            .unwrap();
        assert_eq!(gauge.level, Level::Value1, "{mode}");

        let graded: Graded = mapper.map(&Gauge { level: Level::Value2 }).unwrap();
        assert_eq!(graded.level, Grade::Value2, "{mode}");

        let graded: Graded = mapper.map(&Gauge { level: Level::Value3 }).unwrap();
        assert_eq!(graded.level, Grade::Value1, "{mode}");
    }
}

#[test]
fn repeated_plans_come_from_the_cache() {
    for mode in MODES {
        let mapper = mapper(mode);
        let source = Customer {
            name: "Maude".into(),
            ..Customer::default()
        };

        let first: CustomerSummary = mapper.map(&source).unwrap();
        let cached = mapper.plan_cache_len();
        let second: CustomerSummary = mapper.map(&source).unwrap();

        assert_eq!(first, second, "{mode}");
        assert_eq!(mapper.plan_cache_len(), cached, "{mode}");

        let (customer, summary) = (name_of::<Customer>(), name_of::<CustomerSummary>());
        let plan = mapper.plan(&customer, &summary).unwrap();
        let again = mapper.plan(&customer, &summary).unwrap();
        assert_eq!(plan, again, "{mode}");
        assert_eq!(mapper.plan_cache_len(), cached, "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Headline {
    #[converter("shout")]
    title: String,
    #[copy_ignore]
    draft: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Article {
    title: String,
    draft: bool,
}

#[test]
fn converters_and_ignored_fields() {
    for mode in MODES {
        let mapper = mapper(mode);
        mapper.register_converter("shout", |value: Value| -> crate::Result<Value> {
            Ok(Value::String(value.as_str().unwrap_or_default().to_uppercase()))
        });

        let headline: Headline = mapper
            .map(&Article {
                title: "d'oh".into(),
                draft: true,
            })
            .unwrap();
        assert_eq!(headline.title, "D'OH", "{mode}");
        assert!(!headline.draft, "{mode}");
    }
}

#[test]
fn bind_from_keeps_untouched_fields() {
    for mode in MODES {
        let existing = Customer {
            email: "keep@example.com".into(),
            ..Customer::default()
        };
        let source = CustomerSummary {
            name:   "Moe".into(),
            age:    45,
            active: false,
        };

        let updated = mapper(mode).bind_from(existing, &source).unwrap();
        assert_eq!(updated.name, "Moe", "{mode}");
        assert_eq!(updated.age, 45, "{mode}");
        assert_eq!(updated.email, "keep@example.com", "{mode}");
    }
}

#[test]
fn map_all_preserves_order() {
    let sources = [
        Customer {
            name: "Lenny".into(),
            ..Customer::default()
        },
        Customer {
            name: "Carl".into(),
            ..Customer::default()
        },
    ];
    let summaries: Vec<CustomerSummary> = mapper(ExecutionMode::Compiled)
        .map_all(&sources)
        .unwrap();
    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Lenny", "Carl"]);
}

#[test]
fn global_free_functions_share_one_mapper() {
    let summary: CustomerSummary = crate::map(&Customer {
        name: "Apu".into(),
        age: 38,
        ..Customer::default()
    })
    .unwrap();
    assert_eq!(summary.name, "Apu");
    assert_eq!(summary.age, 38);

    let bound = crate::bind_from(CustomerSummary::default(), &summary).unwrap();
    assert_eq!(bound, summary);
    assert!(Mapper::global().plan_cache_len() >= 2);
}

fn configure_profile(configurator: &mut MappingConfigurator) {
    configurator.map("DisplayName", &["First", "Last"]);
}

#[derive(Debug, Clone, PartialEq, Mappable)]
#[mapping(name = "ProfileView", configure = configure_profile, default)]
struct Profile {
    display_name: String,
    visits:       u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            display_name: "anonymous".into(),
            visits:       1,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Account {
    first: Option<String>,
    last:  String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct AccountPage {
    #[complex_bind(dest = "Profile.DisplayName", source = "Last")]
    title:   String,
    profile: Option<Profile>,
}

#[test]
fn container_attributes_shape_the_descriptor() {
    let account = Account {
        first: None,
        last:  "Gumble".into(),
    };
    for mode in MODES {
        let mapper = mapper(mode);

        let profile: Profile = mapper.map(&account).unwrap();
        assert_eq!(profile.display_name, "Gumble", "{mode}");
        assert_eq!(profile.visits, 1, "{mode}");
        assert!(mapper.registry().contains(&TypeName::from("ProfileView")));

        let page: AccountPage = mapper.map(&account).unwrap();
        assert_eq!(
            page.profile,
            Some(Profile {
                display_name: "Gumble".into(),
                visits:       1,
            }),
            "{mode}"
        );
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Meta {
    code: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct ChildSource {
    meta: Meta,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct RootSource {
    child: ChildSource,
    meta:  Option<Meta>,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct ChildView {
    #[bind_to("Meta.Code")]
    label: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct RootView {
    child: ChildView,
}

#[test]
fn nested_fields_read_only_their_own_candidates() {
    let nested_only = RootSource {
        child: ChildSource {
            meta: Meta {
                code: "child-meta".into(),
            },
        },
        meta:  None,
    };
    let with_root_meta = RootSource {
        meta: Some(Meta {
            code: "root-meta".into(),
        }),
        ..nested_only.clone()
    };
    for mode in MODES {
        let mapper = mapper(mode);
        mapper.register_type::<RootSource>();
        mapper.register_type::<RootView>();
        let plan = mapper
            .plan(&name_of::<RootSource>(), &name_of::<RootView>())
            .unwrap();
        let candidates: Vec<&str> = plan
            .entry("Child.Label")
            .unwrap()
            .candidates()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(candidates, ["Meta.Code", "Child.Label"], "{mode}");
        assert!(plan.entry("Child").unwrap().is_expanded(), "{mode}");

        let view: RootView = mapper.map(&nested_only).unwrap();
        assert_eq!(view.child.label, "", "{mode}");

        let view: RootView = mapper.map(&with_root_meta).unwrap();
        assert_eq!(view.child.label, "root-meta", "{mode}");
    }
}

mod north {
    use crate::Mappable;

    #[derive(Debug, Default, Clone, PartialEq, Mappable)]
    pub struct Address {
        pub street: String,
    }
}

mod south {
    use crate::Mappable;

    #[derive(Debug, Default, Clone, PartialEq, Mappable)]
    pub struct Address {
        pub zip: String,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct Postal {
    zip:    String,
    street: String,
}

#[test]
fn same_named_types_in_different_modules_stay_apart() {
    let postal = Postal {
        zip:    "90210".into(),
        street: "Main".into(),
    };
    assert_ne!(name_of::<north::Address>(), name_of::<south::Address>());
    for mode in MODES {
        let mapper = mapper(mode);
        let north: north::Address = mapper.map(&postal).unwrap();
        let south: south::Address = mapper.map(&postal).unwrap();
        assert_eq!(north.street, "Main", "{mode}");
        assert_eq!(south.zip, "90210", "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct ScoreSheet {
    name:   String,
    scores: Vec<i32>,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct PodiumScores {
    name:   String,
    scores: [i32; 3],
}

#[test]
fn arrays_of_the_wrong_length_leave_the_field_alone() {
    let short = ScoreSheet {
        name:   "n".into(),
        scores: vec![1, 2],
    };
    let exact = ScoreSheet {
        name:   "m".into(),
        scores: vec![7, 8, 9],
    };
    for mode in MODES {
        let mapper = mapper(mode);

        let podium: PodiumScores = mapper.map(&short).unwrap();
        assert_eq!(podium.name, "n", "{mode}");
        assert_eq!(podium.scores, [0, 0, 0], "{mode}");

        let podium: PodiumScores = mapper.map(&exact).unwrap();
        assert_eq!(podium.scores, [7, 8, 9], "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct FirstName {
    name1: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct SecondName {
    name2: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct BothNames {
    name1: String,
    name2: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct NameHolder {
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct NameTarget {
    #[complex_bind(dest = "Holder.Name", source = "Name2")]
    #[complex_bind(dest = "Holder.Name", source = "Name1")]
    holder: Option<NameHolder>,
}

#[test]
fn first_non_null_complex_bind_wins() {
    for mode in MODES {
        let mapper = mapper(mode);

        let target: NameTarget = mapper
            .map(&FirstName {
                name1: "Source1".into(),
            })
            .unwrap();
        assert_eq!(target.holder.unwrap().name, "Source1", "{mode}");

        let target: NameTarget = mapper
            .map(&SecondName {
                name2: "Source2".into(),
            })
            .unwrap();
        assert_eq!(target.holder.unwrap().name, "Source2", "{mode}");

        let target: NameTarget = mapper
            .map(&BothNames {
                name1: "skipped".into(),
                name2: "taken".into(),
            })
            .unwrap();
        assert_eq!(target.holder.unwrap().name, "taken", "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct DeepC {
    c: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct DeepB {
    b: DeepC,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct DeepSource {
    a: DeepB,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct AbsoluteInner {
    #[bind_to("A.B.C")]
    x: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct AbsoluteTarget {
    a: AbsoluteInner,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct ShallowY {
    y: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct ShallowSource {
    a: ShallowY,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct RelativeInner {
    #[bind_to("Y")]
    z: String,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct RelativeTarget {
    a: RelativeInner,
}

#[test]
fn nested_bind_to_paths_resolve_from_root_or_parent() {
    let deep = DeepSource {
        a: DeepB {
            b: DeepC {
                c: "Value7".into(),
            },
        },
    };
    let shallow = ShallowSource {
        a: ShallowY {
            y: "Value9".into(),
        },
    };
    for mode in MODES {
        let mapper = mapper(mode);

        let absolute: AbsoluteTarget = mapper.map(&deep).unwrap();
        assert_eq!(absolute.a.x, "Value7", "{mode}");

        let relative: RelativeTarget = mapper.map(&shallow).unwrap();
        assert_eq!(relative.a.z, "Value9", "{mode}");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct OffsetStamps {
    values: Vec<DateTime<FixedOffset>>,
}

#[derive(Debug, Default, Clone, PartialEq, Mappable)]
struct UtcStamps {
    values: Vec<DateTime<Utc>>,
}

#[test]
fn offset_lists_convert_element_wise_to_utc() {
    let first = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 5, 1, 0, 0, 0)
        .unwrap();
    let second = FixedOffset::east_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 5, 2, 15, 30, 0)
        .unwrap();
    let source = OffsetStamps {
        values: vec![first, second],
    };
    for mode in MODES {
        let stamps: UtcStamps = mapper(mode).map(&source).unwrap();
        assert_eq!(
            stamps.values,
            [
                Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 5, 2, 12, 30, 0).unwrap(),
            ],
            "{mode}"
        );
    }
}

#[test]
fn concurrent_first_mappings_share_one_plan() {
    for mode in MODES {
        let mapper = mapper(mode);
        let source = Customer {
            name: "Barney".into(),
            age: 40,
            ..Customer::default()
        };

        let (plans, summaries): (Vec<_>, Vec<_>) = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let summary: CustomerSummary = mapper.map(&source).unwrap();
                        let plan = mapper
                            .plan(&name_of::<Customer>(), &name_of::<CustomerSummary>())
                            .unwrap();
                        (plan, summary)
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .unzip()
        });

        assert!(plans.iter().all(|plan| Arc::ptr_eq(plan, &plans[0])), "{mode}");
        assert!(
            summaries
                .iter()
                .all(|summary| summary.name == "Barney" && summary.age == 40),
            "{mode}"
        );
        assert_eq!(mapper.plan_cache_len(), 1, "{mode}");
        let compiled = usize::from(mode == ExecutionMode::Compiled);
        assert_eq!(mapper.compiled_cache_len(), compiled, "{mode}");
    }
}
