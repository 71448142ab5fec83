/// Example program to print the loaded configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    let config = rune_config::AreaConfig::load();

    println!("=== Area Configuration ===\n");

    println!("Text Settings:");
    println!("  Font: {}", config.text.font);
    println!("  Charsize: {}", config.text.charsize);
    println!("  Word Dividers: {:?}", config.text.word_dividers);
    println!("  Line Spacing: {}", config.text.line_spacing);
    println!("  Font Dirs: {:?}", config.text.font_dirs);
    println!("  System Fonts: {}", config.text.system_fonts);
    println!();

    println!("Typewriter Settings:");
    println!("  Chars Per Second: {}", config.typewriter.chars_per_second);
    println!("  Short Pause: {} ms", config.typewriter.short_pause_ms);
    println!("  Long Pause: {} ms", config.typewriter.long_pause_ms);
    println!();

    println!("Rendering Settings:");
    println!("  Effect Frame: {} ms", config.rendering.effect_frame_ms);
    println!("  Pixel Format: {}", config.rendering.pixel_format);
    println!("  Margin: {}", config.rendering.margin);
    println!("  Background: {}", config.rendering.background);
    println!();

    println!("History Settings:");
    println!("  Limit: {}", config.history.limit);
    println!("  Merge Window: {} ms", config.history.merge_window_ms);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
