use polytrace::{Canvas, Chromosome, Engine, ImageError, Polygon, RunSettings, TargetImage};
use rand::SeedableRng;
use rand_pcg::Pcg32;

fn two_tone(w: u32, h: u32) -> TargetImage {
    let img = image::RgbaImage::from_fn(w, h, |x, _| {
        if x < w / 2 {
            image::Rgba([20, 40, 160, 255])
        } else {
            image::Rgba([230, 200, 30, 255])
        }
    });
    TargetImage::try_from(img).unwrap()
}

#[test]
fn evolution_improves_on_the_initial_population() {
    let settings = RunSettings {
        vertex_count: 4,
        polygon_count: 8,
        mutation_rate: 0.05,
        mutation_amount: 0.2,
        population_size: 12,
        elitism: 2,
        tournament_size: 3,
        generations: 40,
        seed: 1234,
    };
    let mut engine = Engine::new(two_tone(24, 16), settings).unwrap();

    let first = engine.step().unwrap();
    let last = engine.run(39, |_| {}).unwrap().unwrap();

    assert_eq!(last.generation, 39);
    assert!(last.best_fitness >= first.best_fitness);
    assert!(last.best_fitness <= 1.0);
    assert!(last.metrics.sad_per_px >= 0.0);
}

#[test]
fn mutated_offspring_are_independent_of_their_parent() {
    let target = two_tone(16, 16);
    let mut canvas = target.blank_canvas().unwrap();
    let mut rng = Pcg32::seed_from_u64(77);

    let parent = Chromosome::random(&mut rng, 5, 10);
    let before = parent.clone();
    let parent_score = parent.fitness(&target, &mut canvas).unwrap();

    let child = parent.mutate(&mut rng, 1.0, 0.3);
    assert_eq!(parent, before);
    assert_eq!(child.len(), 10);
    assert!(child.polygons().iter().all(|p| p.vertex_count() == 5));
    assert!(child.polygons().iter().all(|p| p.data().iter().all(|v| (0.0..=1.0).contains(v))));

    // parent's score is untouched by scoring the child on the same canvas
    child.fitness(&target, &mut canvas).unwrap();
    assert_eq!(parent.evaluate(&target, &mut canvas).unwrap(), parent_score);
}

#[test]
fn opaque_cover_of_the_reference_color_is_a_perfect_match() {
    let rgba = [51u8, 102, 204, 255];
    let target = TargetImage::new(9, 7, rgba.repeat(63)).unwrap();
    let mut canvas = Canvas::new(9, 7).unwrap();
    let color = rgba.map(|c| c as f32 / 255.0);
    let mut data = color.to_vec();
    data.extend_from_slice(&[-1.0, -1.0, 2.0, -1.0, 2.0, 2.0, -1.0, 2.0]);
    let cover = Chromosome::new(vec![Polygon::from_data(data).unwrap()]).unwrap();

    assert_eq!(cover.fitness(&target, &mut canvas).unwrap(), 1.0);
}

#[test]
fn mismatched_canvas_is_refused() {
    let target = two_tone(8, 8);
    let mut canvas = Canvas::new(16, 8).unwrap();
    let chromosome = Chromosome::random(&mut Pcg32::seed_from_u64(1), 3, 1);
    assert!(matches!(
        chromosome.fitness(&target, &mut canvas),
        Err(ImageError::DimensionMismatch { .. })
    ));
}
