/// Browser-like history the detail view can step back through.
pub trait Location: Send {
    /// Record that `route` is now shown.
    fn visit(&mut self, route: &str);

    /// Leave the current route and return the one shown before it.
    fn back(&mut self) -> Option<String>;
}

#[derive(Debug, Default)]
pub struct History {
    stack: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }
}

impl Location for History {
    fn visit(&mut self, route: &str) {
        // re-entering the route we just went back to is not a new step
        if self.current() != Some(route) {
            self.stack.push(route.to_string());
        }
    }

    fn back(&mut self) -> Option<String> {
        if self.stack.len() < 2 {
            return None;
        }
        self.stack.pop();
        self.stack.last().cloned()
    }
}
