use colored::Colorize;

pub fn print_success(message: &str) {
    println!("{} {}", "✔".green(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✘".red(), message);
}

pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
