/// A submodule that cuts raw save text into tokens.
mod tokens;

/// A submodule that provides the intermediate parsing interface for the save file.
/// The parser uses [GameObjectMap] to store the parsed data and structures in
/// [structures](crate::structures) are initialized from these objects.
mod game_object;
pub use game_object::{GameObjectMap, GameString, SaveFileValue};

/// A submodule that turns token streams into object trees, one [Section] at a time.
mod section;
pub use section::{parse_root, Section};

/// A submodule that locates named blocks in the raw text without
/// tokenizing the whole document.
mod section_reader;

/// A submodule that provides the [SaveFile] object, which owns the
/// decompressed save text and hands out sections of it.
mod save_file;
pub use save_file::SaveFile;

#[cfg(test)]
mod tests {
    use super::*;

    // a miniature save exercising the whole extract-tokenize-parse path
    const SAVE: &str = r#"
        player="GER"
        date="1936.1.1"
        # the interesting bits
        countries={
            FRA={
                stability=0.55
                politics={
                    ruling_party=democratic
                    political_power=120.5
                }
            }
            GER={
                stability=0.60
                war_support=0.80
                major=yes
                politics={
                    ruling_party=fascism
                    political_power=350
                }
                units={
                    division={
                        division_template_id={ id=7 type=75 }
                    }
                }
            }
        }
    "#;

    #[test]
    fn test_pipeline_country() {
        let save = SaveFile::from_text(SAVE.to_owned());
        let tags = save.child_tags("countries");
        assert_eq!(tags, vec!["FRA", "GER"]);
        let country = save.child_block("countries", "GER").unwrap().parse();
        assert_eq!(country.get_real("stability"), Some(0.60));
        assert_eq!(country.get_boolean("major"), Some(true));
        assert_eq!(
            *country
                .get_path_string(&["politics", "ruling_party"])
                .unwrap(),
            "fascism".to_owned()
        );
        assert_eq!(
            country.get_path_real(&["politics", "political_power"]),
            Some(350.0)
        );
    }

    #[test]
    fn test_pipeline_header() {
        let save = SaveFile::from_text(SAVE.to_owned());
        let header = save.header();
        assert_eq!(*header.get_string("player").unwrap(), "GER".to_owned());
    }

    #[test]
    fn test_pipeline_absent_country() {
        let save = SaveFile::from_text(SAVE.to_owned());
        assert!(save.child_block("countries", "USA").is_none());
    }

    #[test]
    fn test_nested_unit_reachable() {
        let save = SaveFile::from_text(SAVE.to_owned());
        let country = save.child_block("countries", "GER").unwrap().parse();
        let id = country
            .get_path_real(&["units", "division", "division_template_id", "id"])
            .unwrap();
        assert_eq!(id, 7.0);
    }
}
