use dish_detail::{form::Field, DetailView, DishDetail, RouteParams};

pub(super) const HELP: &str = "\
Commands:
  open <id>         show a dish
  next | prev       move to the neighbouring dish
  back              return to the previous dish
  show              print the current dish
  author <name>     set the comment author
  rating <1-5>      set the rating
  comment <text>    set the comment text
  submit            post the comment
  reset             clear the form
  quit";

#[derive(Debug, PartialEq, Eq)]
pub(super) enum ViewerAction {
    Open(String),
    Next,
    Prev,
    Back,
    Show,
    Author(String),
    Rating(u8),
    Comment(String),
    Submit,
    Reset,
    Help,
    Quit,
}

impl ViewerAction {
    pub(super) fn new(line: &str) -> Result<Self, &'static str> {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        let needs_arg = |make: fn(String) -> Self| {
            if rest.is_empty() {
                Err("missing argument")
            } else {
                Ok(make(rest.to_string()))
            }
        };

        match cmd {
            "open" => needs_arg(Self::Open),
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            "back" => Ok(Self::Back),
            "show" | "" => Ok(Self::Show),
            "author" => needs_arg(Self::Author),
            "comment" => needs_arg(Self::Comment),
            "rating" => {
                let Ok(rating) = rest.parse() else {
                    return Err("Can not parse your argument into number")
                };
                Ok(Self::Rating(rating))
            }
            "submit" => Ok(Self::Submit),
            "reset" => Ok(Self::Reset),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err("unexpected command"),
        }
    }

    /// Consume the action. Returns false once the viewer should exit.
    pub(super) async fn run(self, detail: &mut DishDetail) -> anyhow::Result<bool> {
        match self {
            Self::Open(id) => navigate(detail, id).await,
            Self::Next => {
                let next = detail.view().await.next;
                step(detail, next).await;
            }
            Self::Prev => {
                let prev = detail.view().await.prev;
                step(detail, prev).await;
            }
            Self::Back => match detail.go_back().await {
                Some(id) => navigate(detail, id).await,
                None => println!("Nothing to go back to."),
            },
            Self::Show => print_view(&detail.view().await),
            Self::Author(author) => {
                detail.form_mut().set_author(author);
                print_form_errors(detail);
            }
            Self::Rating(rating) => {
                detail.form_mut().set_rating(rating);
                print_form_errors(detail);
            }
            Self::Comment(comment) => {
                detail.form_mut().set_comment(comment);
                print_form_errors(detail);
            }
            Self::Submit => match detail.submit().await {
                Ok(dish) => println!(
                    "Thanks! {} now has {} comments.",
                    dish.name,
                    dish.comments.len()
                ),
                Err(e) => {
                    println!("Comment not posted: {e:#}");
                    print_form_errors(detail);
                }
            },
            Self::Reset => detail.form_mut().reset(),
            Self::Help => println!("{HELP}"),
            Self::Quit => return Ok(false),
        }

        Ok(true)
    }
}

async fn navigate(detail: &mut DishDetail, id: String) {
    detail.route_changed(RouteParams::with_id(id)).await;
    detail.settled().await;
    print_view(&detail.view().await);
}

async fn step(detail: &mut DishDetail, target: Option<String>) {
    match target {
        Some(id) => navigate(detail, id).await,
        None => println!("No neighbouring dish known yet."),
    }
}

fn print_view(view: &DetailView) {
    if let Some(err) = &view.err_mess {
        println!("Error: {err}");
    }
    let Some(dish) = &view.dish else {
        println!("No dish loaded.");
        return;
    };

    println!("{} [{}] {:.2}", dish.name, dish.category, dish.price);
    if !dish.description.is_empty() {
        println!("  {}", dish.description);
    }
    for comment in &dish.comments {
        println!(
            "  {} -- {}, {} ({} stars)",
            comment.comment, comment.author, comment.date, comment.rating
        );
    }
    println!(
        "prev: {}  next: {}",
        view.prev.as_deref().unwrap_or("-"),
        view.next.as_deref().unwrap_or("-")
    );
}

fn print_form_errors(detail: &DishDetail) {
    let errors = detail.form_errors();
    for field in Field::ALL {
        let message = errors.get(field);
        if !message.is_empty() {
            println!("{}: {message}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(ViewerAction::new("open 3"), Ok(ViewerAction::Open("3".into())));
        assert_eq!(ViewerAction::new("  next "), Ok(ViewerAction::Next));
        assert_eq!(
            ViewerAction::new("comment so   good"),
            Ok(ViewerAction::Comment("so   good".into()))
        );
        assert_eq!(ViewerAction::new("rating 4"), Ok(ViewerAction::Rating(4)));
        assert_eq!(ViewerAction::new(""), Ok(ViewerAction::Show));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ViewerAction::new("open"), Err("missing argument"));
        assert!(ViewerAction::new("rating five").is_err());
        assert_eq!(ViewerAction::new("dance"), Err("unexpected command"));
    }
}
