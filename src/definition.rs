//! Menu definitions: declarative templates the service materializes into live
//! menus, one per open call.

use std::fmt;
use std::sync::Arc;

use crate::config::FillPolicy;
use crate::context::Context;
use crate::error::MenuError;
use crate::events::Listener;
use crate::menu::{Menu, PageableMenu, SimpleMenu, MAX_ROWS};
use crate::visual::Visual;

/// Supplies the visuals of one page, laid out from slot 0.
pub trait ContentProvider: Send + Sync {
    fn contents(&self) -> Vec<Option<Visual>>;
}

impl<F> ContentProvider for F
where
    F: Fn() -> Vec<Option<Visual>> + Send + Sync,
{
    fn contents(&self) -> Vec<Option<Visual>> {
        self()
    }
}

/// Fixed page contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticPage(Vec<Option<Visual>>);

impl StaticPage {
    pub fn new(contents: Vec<Option<Visual>>) -> Self {
        Self(contents)
    }
}

impl ContentProvider for StaticPage {
    fn contents(&self) -> Vec<Option<Visual>> {
        self.0.clone()
    }
}

/// Id, title and height shared by every definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSpec {
    id: String,
    title: String,
    rows: usize,
}

impl DefinitionSpec {
    pub fn new(id: impl Into<String>, title: impl Into<String>, rows: usize) -> Result<Self, MenuError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(MenuError::precondition("Menu id must not be empty"));
        }
        if rows == 0 || rows > MAX_ROWS {
            return Err(MenuError::precondition(format!(
                "Rows must be between 1 and {}, got {}",
                MAX_ROWS, rows
            )));
        }
        Ok(Self {
            id,
            title: title.into(),
            rows,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn size(&self) -> usize {
        self.rows * crate::menu::ROW_SIZE
    }
}

/// A template registered with the [`MenuService`](crate::service::MenuService).
///
/// Only [`spec`](MenuDefinition::spec) is required. The default
/// [`create`](MenuDefinition::create) builds a [`SimpleMenu`], lays out
/// [`contents`](MenuDefinition::contents) and hands the menu to
/// [`configure`](MenuDefinition::configure).
pub trait MenuDefinition: Send + Sync {
    fn spec(&self) -> &DefinitionSpec;

    fn id(&self) -> &str {
        self.spec().id()
    }

    fn contents(&self, _context: &Context) -> Vec<Option<Visual>> {
        Vec::new()
    }

    /// Add this definition's event handlers. The service registers the
    /// listener under the definition id, so handlers only see events from
    /// menus this definition created.
    fn register_handlers(&self, _listener: &mut Listener) {}

    fn configure(&self, _menu: &SimpleMenu, _context: &Context) -> Result<(), MenuError> {
        Ok(())
    }

    /// Materialize a menu for one open call. Requires the acting user and the
    /// service in `context`.
    fn create(&self, context: &Context) -> Result<Arc<dyn Menu>, MenuError> {
        let user = context.require_user()?;
        let service = context.require_service()?;
        let spec = self.spec();
        let menu = SimpleMenu::new(spec.title(), spec.size(), user, context.clone(), service.env().clone())?;
        menu.place_contents(self.contents(context))?;
        self.configure(&menu, context)?;
        let menu: Arc<dyn Menu> = menu;
        Ok(menu)
    }
}

type HandlerSetup = Box<dyn Fn(&mut Listener) + Send + Sync>;

/// Single-page definition assembled from fixed contents and a few options.
pub struct StaticDefinition {
    spec: DefinitionSpec,
    contents: Vec<Option<Visual>>,
    fill: Option<FillPolicy>,
    uncloseable: bool,
    close_button: Option<usize>,
    back_button: Option<usize>,
    handlers: Option<HandlerSetup>,
}

impl StaticDefinition {
    pub fn new(spec: DefinitionSpec) -> Self {
        Self {
            spec,
            contents: Vec::new(),
            fill: None,
            uncloseable: false,
            close_button: None,
            back_button: None,
            handlers: None,
        }
    }

    pub fn with_contents(mut self, contents: Vec<Option<Visual>>) -> Self {
        self.contents = contents;
        self
    }

    /// Overrides the configured fill policy for menus of this definition.
    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn uncloseable(mut self) -> Self {
        self.uncloseable = true;
        self
    }

    pub fn with_close_button(mut self, slot: usize) -> Self {
        self.close_button = Some(slot);
        self
    }

    /// The button only appears when the menu was opened from another session.
    pub fn with_back_button(mut self, slot: usize) -> Self {
        self.back_button = Some(slot);
        self
    }

    pub fn with_handlers(mut self, setup: impl Fn(&mut Listener) + Send + Sync + 'static) -> Self {
        self.handlers = Some(Box::new(setup));
        self
    }
}

impl ContentProvider for StaticDefinition {
    fn contents(&self) -> Vec<Option<Visual>> {
        self.contents.clone()
    }
}

impl MenuDefinition for StaticDefinition {
    fn spec(&self) -> &DefinitionSpec {
        &self.spec
    }

    fn contents(&self, _context: &Context) -> Vec<Option<Visual>> {
        self.contents.clone()
    }

    fn register_handlers(&self, listener: &mut Listener) {
        if let Some(setup) = &self.handlers {
            setup(listener);
        }
    }

    fn configure(&self, menu: &SimpleMenu, _context: &Context) -> Result<(), MenuError> {
        if let Some(fill) = self.fill {
            menu.set_fill_policy(fill);
        }
        menu.set_uncloseable(self.uncloseable);
        // Decoration runs first so the buttons are never overwritten.
        menu.ensure_filled();
        if let Some(slot) = self.close_button {
            menu.add_close_button(slot)?;
        }
        if let Some(slot) = self.back_button {
            menu.add_back_button(slot)?;
        }
        Ok(())
    }
}

impl fmt::Debug for StaticDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDefinition")
            .field("spec", &self.spec)
            .field("uncloseable", &self.uncloseable)
            .finish()
    }
}

/// Definition of a [`PageableMenu`]: the last row is reserved for navigation.
pub struct PagedDefinition {
    spec: DefinitionSpec,
    pages: Vec<Arc<dyn ContentProvider>>,
    handlers: Option<HandlerSetup>,
}

impl PagedDefinition {
    pub fn new(spec: DefinitionSpec) -> Result<Self, MenuError> {
        if spec.rows() < 2 {
            return Err(MenuError::precondition(
                "A paged menu needs at least one content row and the navigation row",
            ));
        }
        Ok(Self {
            spec,
            pages: Vec::new(),
            handlers: None,
        })
    }

    pub fn with_page(mut self, page: impl ContentProvider + 'static) -> Self {
        self.pages.push(Arc::new(page));
        self
    }

    pub fn with_handlers(mut self, setup: impl Fn(&mut Listener) + Send + Sync + 'static) -> Self {
        self.handlers = Some(Box::new(setup));
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl MenuDefinition for PagedDefinition {
    fn spec(&self) -> &DefinitionSpec {
        &self.spec
    }

    fn register_handlers(&self, listener: &mut Listener) {
        if let Some(setup) = &self.handlers {
            setup(listener);
        }
    }

    fn create(&self, context: &Context) -> Result<Arc<dyn Menu>, MenuError> {
        let user = context.require_user()?;
        let service = context.require_service()?;
        let menu = PageableMenu::new(
            self.spec.title(),
            self.spec.rows() - 1,
            user,
            context.clone(),
            service.env().clone(),
        )?;
        menu.add_pages(self.pages.iter().cloned());
        let menu: Arc<dyn Menu> = menu;
        Ok(menu)
    }
}
