//! Registry and open_menu behaviour seen from feature code.

use std::sync::Arc;

use gridmenu::context::keys;
use gridmenu::{
    Context, DefinitionSpec, DefinitionTag, HandlerOptions, Menu, MenuDefinition, MenuError, OpenEvent,
    SimpleMenu, Visual,
};

use super::test_utils::{entries, new_log, record, static_menu, user, Harness};

/// Shows the user's coin balance; needs `coins` in the context.
struct Wallet {
    spec: DefinitionSpec,
}

impl Wallet {
    fn new() -> Self {
        Self {
            spec: DefinitionSpec::new("wallet", "Wallet", 1).unwrap(),
        }
    }
}

impl MenuDefinition for Wallet {
    fn spec(&self) -> &DefinitionSpec {
        &self.spec
    }

    fn contents(&self, context: &Context) -> Vec<Option<Visual>> {
        let coins = context.get::<u32>("coins").unwrap_or(0);
        vec![Some(Visual::new("gold_nugget").with_amount(coins))]
    }

    fn configure(&self, menu: &SimpleMenu, context: &Context) -> Result<(), MenuError> {
        let coins = context.require::<u32>("coins")?;
        if coins > 64 {
            menu.add_item(gridmenu::MenuItem::new(8, Visual::new("gold_block")))?;
        }
        Ok(())
    }
}

#[test]
fn unknown_ids_fail_without_breaking_the_service() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(static_menu("shop", 1)));

    let err = harness
        .service
        .open_menu(&user("alex"), "missing", Context::new(), None)
        .unwrap_err();
    assert_eq!(err, MenuError::NotRegistered("missing".to_string()));

    let session = harness.open(&user("alex"), "shop");
    assert!(session.is_open());
}

#[test]
fn open_menu_stamps_the_context() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(static_menu("shop", 1)));
    harness.service.register_menu(Arc::new(static_menu("cart", 1)));
    let alex = user("alex");

    let shop = harness.open(&alex, "shop");
    let ctx = shop.context();
    assert_eq!(ctx.user(), Some(alex.clone()));
    assert_eq!(ctx.definition_tag(), Some(DefinitionTag::new("shop")));
    assert!(Arc::ptr_eq(&ctx.service().unwrap(), &harness.service));
    assert!(!ctx.contains(keys::PREVIOUS_SESSION));

    let cart = harness.open_from(&alex, "cart", &shop);
    assert!(Arc::ptr_eq(&cart.context().previous_session().unwrap(), &shop));
}

#[test]
fn definitions_read_their_parameters_from_the_context() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(Wallet::new()));
    let ctx = Context::new();
    ctx.put("coins", 80u32);

    let session = harness.service.open_menu(&user("alex"), "wallet", ctx, None).unwrap();
    let cells = harness.cells(&session);
    assert_eq!(cells[0].as_ref().unwrap().amount, 80);
    assert_eq!(harness.material_at(&session, 8).as_deref(), Some("gold_block"));
}

#[test]
fn missing_required_values_fail_the_open() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(Wallet::new()));

    let err = harness
        .service
        .open_menu(&user("alex"), "wallet", Context::new(), None)
        .unwrap_err();
    assert_eq!(err, MenuError::MissingContextValue("coins".to_string()));
    assert!(harness.renderer.showing_for(&user("alex")).is_empty());
}

#[test]
fn open_or_notify_tells_the_user_why() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(Wallet::new()));
    let alex = user("alex");

    let session = harness.service.open_menu_or_notify(&alex, "wallet", Context::new(), None);
    assert!(session.is_none());
    assert_eq!(
        harness.renderer.messages(),
        vec![(
            alex,
            "Could not open menu 'wallet': Missing context value: coins".to_string()
        )]
    );
}

#[test]
fn re_registering_replaces_definition_and_handlers() {
    let harness = Harness::new();
    let log = new_log();
    for version in ["v1", "v2"] {
        let log = log.clone();
        harness.service.register_menu(Arc::new(static_menu("shop", 1).with_handlers(move |listener| {
            let log = log.clone();
            listener.on("open", HandlerOptions::default(), move |_: &mut OpenEvent| {
                record(&log, version);
                Ok(())
            });
        })));
    }

    assert_eq!(harness.service.menu_ids(), vec!["shop".to_string()]);
    assert_eq!(harness.events().handler_count::<OpenEvent>(), 1);
    harness.open(&user("alex"), "shop");
    assert_eq!(entries(&log), vec!["v2"]);
}

#[test]
fn shutdown_leaves_nothing_registered() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(static_menu("shop", 1).with_handlers(|listener| {
        listener.on("open", HandlerOptions::default(), |_: &mut OpenEvent| Ok(()));
    })));
    harness.service.shutdown();

    assert!(!harness.service.is_registered("shop"));
    assert_eq!(harness.events().handler_count::<OpenEvent>(), 0);
    assert!(matches!(
        harness.service.open_menu(&user("alex"), "shop", Context::new(), None),
        Err(MenuError::NotRegistered(_))
    ));
}

#[test]
fn menus_are_created_per_open() {
    let harness = Harness::new();
    harness.service.register_menu(Arc::new(static_menu("shop", 1)));
    let first = harness.open(&user("alex"), "shop");
    let second = harness.open(&user("blair"), "shop");

    assert_ne!(first.id(), second.id());
    assert_ne!(first.menu().core().surface().id, second.menu().core().surface().id);
    assert_eq!(second.menu().core().user(), &user("blair"));
}
