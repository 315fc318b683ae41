//! Interactive terminal app
//!
//! A small state machine: sign in, pick a list from the menu, edit it in the
//! list view. The list view re-syncs and redraws on a timer while it waits for
//! input, so edits made elsewhere show up without pressing anything.

use std::{io::Write, path::PathBuf, time::Duration};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, Lines},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    config::valid_user_name,
    local::LocalStore,
    remote::RouterClient,
    session::{ShoppingSession, SyncStatus},
};

enum Screen {
    Menu,
    List(String),
    Quit,
}

/// What happened while waiting for a menu choice in the list view
enum ListInput {
    Choice(String),
    Refresh,
    Closed,
}

pub struct App<R, W> {
    lines: Lines<R>,
    out: W,
    data_dir: PathBuf,
    user: Option<String>,
    refresh: Duration,
}

impl<R, W> App<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W, data_dir: PathBuf, refresh: Duration) -> Self {
        Self {
            lines: input.lines(),
            out,
            data_dir,
            user: None,
            refresh,
        }
    }

    /// Sign in as this user without asking
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run(&mut self, router: RouterClient) -> anyhow::Result<()> {
        let Some(user) = self.login().await? else {
            return Ok(());
        };
        let store = LocalStore::open(&self.data_dir, &user).await?;
        let session = ShoppingSession::new(&user, store, router);
        writeln!(self.out, "Welcome, {}!", user)?;
        info!(user = %user, "Signed in");

        let mut screen = Screen::Menu;
        loop {
            screen = match screen {
                Screen::Menu => self.menu(&session).await?,
                Screen::List(uuid) => self.list_view(&session, &uuid).await?,
                Screen::Quit => break,
            };
        }

        writeln!(self.out, "Bye!")?;
        Ok(())
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Print `text` and read one trimmed line; `None` once input is closed
    async fn prompt(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        write!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    async fn ask_quantity(&mut self) -> anyhow::Result<Option<u64>> {
        loop {
            let Some(answer) = self.prompt("Quantity: ").await? else {
                return Ok(None);
            };
            match answer.parse::<u64>() {
                Ok(quantity) if quantity > 0 => return Ok(Some(quantity)),
                _ => writeln!(self.out, "Quantity must be a positive number.")?,
            }
        }
    }

    async fn login(&mut self) -> anyhow::Result<Option<String>> {
        if let Some(user) = self.user.take() {
            if valid_user_name(&user) {
                return Ok(Some(user));
            }
            writeln!(self.out, "Invalid user name: {}", user)?;
        }

        loop {
            let Some(user) = self.prompt("User name: ").await? else {
                return Ok(None);
            };
            if valid_user_name(&user) {
                return Ok(Some(user));
            }
            writeln!(
                self.out,
                "User names may only contain letters, digits, '_' and '-'."
            )?;
        }
    }

    fn report(&mut self, status: SyncStatus) -> anyhow::Result<()> {
        if status == SyncStatus::Offline {
            writeln!(self.out, "(offline: changes are kept on this device)")?;
        }
        Ok(())
    }

    // ========================================================================
    // Menu
    // ========================================================================

    async fn menu(&mut self, session: &ShoppingSession) -> anyhow::Result<Screen> {
        writeln!(self.out)?;
        writeln!(self.out, "== Shopping lists ({}) ==", session.user())?;
        writeln!(self.out, "1. Open a list")?;
        writeln!(self.out, "2. Create a list")?;
        writeln!(self.out, "3. Show all lists")?;
        writeln!(self.out, "4. Download a shared list")?;
        writeln!(self.out, "q. Quit")?;

        let Some(choice) = self.prompt("> ").await? else {
            return Ok(Screen::Quit);
        };
        match choice.as_str() {
            "1" => self.open_list(session).await,
            "2" => self.create_list(session).await,
            "3" => {
                self.show_lists(session).await?;
                Ok(Screen::Menu)
            }
            "4" => self.download_list(session).await,
            "q" | "Q" => Ok(Screen::Quit),
            _ => {
                writeln!(self.out, "Unknown option: {}", choice)?;
                Ok(Screen::Menu)
            }
        }
    }

    async fn open_list(&mut self, session: &ShoppingSession) -> anyhow::Result<Screen> {
        let Some(name) = self.prompt("List name: ").await? else {
            return Ok(Screen::Quit);
        };
        match session.find_list(&name).await? {
            Some(uuid) => Ok(Screen::List(uuid)),
            None => {
                writeln!(self.out, "No list named '{}'.", name)?;
                Ok(Screen::Menu)
            }
        }
    }

    async fn create_list(&mut self, session: &ShoppingSession) -> anyhow::Result<Screen> {
        let Some(name) = self.prompt("New list name: ").await? else {
            return Ok(Screen::Quit);
        };
        match session.create_list(&name).await {
            Ok(uuid) => {
                writeln!(self.out, "Created '{}' ({})", name, uuid)?;
                Ok(Screen::List(uuid))
            }
            Err(e) => {
                writeln!(self.out, "Could not create list: {}", e)?;
                Ok(Screen::Menu)
            }
        }
    }

    async fn show_lists(&mut self, session: &ShoppingSession) -> anyhow::Result<()> {
        let lists = session.lists().await?;
        if lists.is_empty() {
            writeln!(self.out, "You have no lists yet.")?;
        }
        for (uuid, name) in lists {
            writeln!(self.out, "- {} ({})", name, uuid)?;
        }
        Ok(())
    }

    async fn download_list(&mut self, session: &ShoppingSession) -> anyhow::Result<Screen> {
        let Some(uuid) = self.prompt("List id: ").await? else {
            return Ok(Screen::Quit);
        };
        match session.download(&uuid).await {
            Ok(list) => {
                writeln!(self.out, "Downloaded '{}'", list.name)?;
                Ok(Screen::List(list.uuid))
            }
            Err(e) => {
                writeln!(self.out, "Could not download list: {}", e)?;
                Ok(Screen::Menu)
            }
        }
    }

    // ========================================================================
    // List view
    // ========================================================================

    async fn draw_list(
        &mut self,
        session: &ShoppingSession,
        uuid: &str,
        products: &[(String, i64)],
    ) -> anyhow::Result<()> {
        let name = session.list_name(uuid).await?.unwrap_or_default();
        writeln!(self.out)?;
        writeln!(self.out, "== {} ({}) ==", name, uuid)?;
        if products.is_empty() {
            writeln!(self.out, "(empty)")?;
        }
        for (product, quantity) in products {
            writeln!(self.out, "{:>4} x {}", quantity, product)?;
        }
        writeln!(self.out, "1. Add product")?;
        writeln!(self.out, "2. Remove product")?;
        writeln!(self.out, "3. Update quantity")?;
        writeln!(self.out, "4. Delete list")?;
        writeln!(self.out, "q. Back")?;
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }

    async fn wait_for_choice(&mut self, ticker: &mut time::Interval) -> anyhow::Result<ListInput> {
        tokio::select! {
            line = self.lines.next_line() => Ok(match line? {
                Some(line) => ListInput::Choice(line.trim().to_string()),
                None => ListInput::Closed,
            }),
            _ = ticker.tick() => Ok(ListInput::Refresh),
        }
    }

    async fn list_view(&mut self, session: &ShoppingSession, uuid: &str) -> anyhow::Result<Screen> {
        match session.sync(uuid).await {
            Ok(status) => self.report(status)?,
            Err(e) => writeln!(self.out, "Sync failed: {}", e)?,
        }
        let mut products = session.products(uuid).await?;
        self.draw_list(session, uuid, &products).await?;

        let mut ticker = time::interval_at(Instant::now() + self.refresh, self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let choice = match self.wait_for_choice(&mut ticker).await? {
                ListInput::Closed => return Ok(Screen::Quit),
                ListInput::Refresh => {
                    if let Err(e) = session.sync(uuid).await {
                        debug!(list = uuid, error = %e, "Background sync failed");
                    }
                    let latest = session.products(uuid).await?;
                    if latest != products {
                        products = latest;
                        self.draw_list(session, uuid, &products).await?;
                    }
                    continue;
                }
                ListInput::Choice(choice) => choice,
            };

            let result = match choice.as_str() {
                "1" => {
                    let Some(name) = self.prompt("Product: ").await? else {
                        return Ok(Screen::Quit);
                    };
                    let Some(quantity) = self.ask_quantity().await? else {
                        return Ok(Screen::Quit);
                    };
                    session.add_product(uuid, &name, quantity).await
                }
                "2" => {
                    let Some(name) = self.prompt("Product: ").await? else {
                        return Ok(Screen::Quit);
                    };
                    session.remove_product(uuid, &name).await
                }
                "3" => {
                    let Some(name) = self.prompt("Product: ").await? else {
                        return Ok(Screen::Quit);
                    };
                    let Some(quantity) = self.ask_quantity().await? else {
                        return Ok(Screen::Quit);
                    };
                    session.update_product(uuid, &name, quantity).await
                }
                "4" => {
                    session.delete_list(uuid).await?;
                    writeln!(self.out, "List deleted from this device.")?;
                    return Ok(Screen::Menu);
                }
                "q" | "Q" => return Ok(Screen::Menu),
                _ => {
                    writeln!(self.out, "Unknown option: {}", choice)?;
                    self.draw_list(session, uuid, &products).await?;
                    continue;
                }
            };

            match result {
                Ok(status) => self.report(status)?,
                Err(e) => writeln!(self.out, "{}", e)?,
            }
            products = session.products(uuid).await?;
            self.draw_list(session, uuid, &products).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_router() -> RouterClient {
        // Nothing listens on the discard port
        RouterClient::new(vec!["http://127.0.0.1:9".to_string()], 200).unwrap()
    }

    async fn run_script(script: &str, user: Option<&str>) -> (String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(
            script.as_bytes(),
            Vec::new(),
            dir.path().to_path_buf(),
            Duration::from_secs(60),
        )
        .with_user(user.map(str::to_string));
        app.run(offline_router()).await.unwrap();
        let output = String::from_utf8(app.into_output()).unwrap();
        (output, dir)
    }

    #[tokio::test]
    async fn test_login_reprompts_on_invalid_name() {
        let (output, dir) = run_script("bad name\nalice\nq\n", None).await;
        assert!(output.contains("User names may only contain"));
        assert!(output.contains("Welcome, alice!"));
        assert!(output.ends_with("Bye!\n"));
        assert!(dir.path().join("alice_shopping.db").exists());
    }

    #[tokio::test]
    async fn test_create_list_and_add_products_offline() {
        let script = "2\ngroceries\n1\nmilk\nzero\n0\n2\n1\nmilk\n1\n3\nmilk\n5\nq\n3\nq\n";
        let (output, _dir) = run_script(script, Some("bob")).await;

        assert!(output.contains("Created 'groceries'"));
        assert!(output.contains("Quantity must be a positive number."));
        assert!(output.contains("(offline: changes are kept on this device)"));
        assert!(output.contains("   2 x milk"));
        assert!(output.contains("already exists"));
        assert!(output.contains("   5 x milk"));
        assert!(output.contains("- groceries ("));
    }

    #[tokio::test]
    async fn test_unknown_options_and_missing_list() {
        let script = "7\n1\nnope\nq\n";
        let (output, _dir) = run_script(script, Some("carol")).await;
        assert!(output.contains("Unknown option: 7"));
        assert!(output.contains("No list named 'nope'."));
    }

    #[tokio::test]
    async fn test_closed_input_quits() {
        let (output, _dir) = run_script("2\nparty\n", Some("dave")).await;
        assert!(output.contains("Created 'party'"));
        assert!(output.ends_with("Bye!\n"));
    }

    #[tokio::test]
    async fn test_delete_list_returns_to_menu() {
        let script = "2\ntrip\n4\n3\nq\n";
        let (output, _dir) = run_script(script, Some("erin")).await;
        assert!(output.contains("List deleted from this device."));
        assert!(output.contains("You have no lists yet."));
    }
}
