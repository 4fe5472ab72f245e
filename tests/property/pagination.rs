//! Pagination index safety under arbitrary navigation

use std::sync::Arc;

use gridmenu::menu::MenuEnv;
use gridmenu::{
    Context, EventManager, MemoryRenderer, MenuConfig, PageableMenu, StaticPage, TickScheduler, UserId, Visual,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Nav {
    Next,
    Previous,
    GoTo(usize),
}

fn nav() -> impl Strategy<Value = Nav> {
    prop_oneof![
        Just(Nav::Next),
        Just(Nav::Previous),
        (0usize..12).prop_map(Nav::GoTo),
    ]
}

fn book(pages: usize) -> Arc<PageableMenu> {
    let env = MenuEnv::new(
        Arc::new(MemoryRenderer::new()),
        Arc::new(TickScheduler::new()),
        Arc::new(EventManager::new()),
        MenuConfig::default(),
    );
    let menu = PageableMenu::new("Book", 2, UserId::new("p"), Context::new(), env).unwrap();
    for i in 0..pages {
        menu.add_page(Arc::new(StaticPage::new(vec![Some(Visual::new(format!("page_{}", i)))])));
    }
    menu
}

proptest! {
    /// The current page always stays in range, and out-of-range jumps fail
    /// without moving
    #[test]
    fn test_navigation_keeps_current_page_in_range(
        pages in 1usize..8,
        steps in prop::collection::vec(nav(), 0..40),
    ) {
        let menu = book(pages);

        for step in steps {
            let before = menu.current_page();
            match step {
                Nav::Next => {
                    let moved = menu.next_page();
                    prop_assert_eq!(moved, before + 1 < pages);
                    prop_assert_eq!(menu.current_page(), if moved { before + 1 } else { before });
                }
                Nav::Previous => {
                    let moved = menu.previous_page();
                    prop_assert_eq!(moved, before > 0);
                    prop_assert_eq!(menu.current_page(), if moved { before - 1 } else { before });
                }
                Nav::GoTo(index) => {
                    let result = menu.go_to_page(index);
                    prop_assert_eq!(result.is_ok(), index < pages);
                    prop_assert_eq!(menu.current_page(), if index < pages { index } else { before });
                }
            }
            prop_assert!(menu.current_page() < pages);
        }
    }
}
