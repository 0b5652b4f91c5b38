use criterion::{criterion_group, criterion_main, Criterion};
use gaussproc_gp::{GaussianProcess, Kernel, Matern52, SquaredExponential, TrainingData, WhiteNoise};
use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;

fn griewank(x: &Array2<f64>) -> Array1<f64> {
    let dim = x.ncols();
    let d = Array1::linspace(1., dim as f64, dim).mapv(|v| v.sqrt());
    x.map_axis(Axis(1), |xi| {
        xi.mapv(|v| v * v).sum() / 4000. - (&xi / &d).mapv(|v| v.cos()).product() + 1.0
    })
}

fn criterion_gp(c: &mut Criterion) {
    let dims = [1, 5];
    let nts = [100, 300];

    let mut group = c.benchmark_group("gp");
    group.sample_size(20);
    for (&dim, &nt) in dims.iter().zip(nts.iter()) {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Array2::random_using((nt, dim), Uniform::new(-10., 10.), &mut rng);
        let yt = griewank(&xt);
        let data = TrainingData::new(xt, yt, Array1::from_elem(nt, 1e-6)).expect("training data");

        let gp =
            GaussianProcess::zero_mean(SquaredExponential::new(1., 2.).add(WhiteNoise::new(0.1)));
        group.bench_function(format!("regress se {dim}d {nt}"), |b| {
            b.iter(|| std::hint::black_box(gp.regress(&data).expect("GP regression")))
        });

        let gp = GaussianProcess::zero_mean(Matern52::new(1., 2.));
        group.bench_function(format!("lml matern52 {dim}d {nt}"), |b| {
            b.iter(|| {
                std::hint::black_box(
                    gp.log_marginal_likelihood(&data)
                        .expect("GP log marginal likelihood"),
                )
            })
        });

        let posterior = gp.regress(&data).expect("GP regression").posterior;
        let xtest = Array2::random_using((50, dim), Uniform::new(-10., 10.), &mut rng);
        group.bench_function(format!("predict valvar {dim}d {nt}"), |b| {
            b.iter(|| {
                std::hint::black_box(posterior.predict_valvar(&xtest).expect("GP prediction"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_gp);
criterion_main!(benches);
