use gaussproc_gp::{
    ConstantMean, GaussianProcess, Kernel, SquaredExponential, TrainingData, WhiteNoise,
};
use ndarray::{arr2, concatenate, Array, Array1, Array2, Axis};

fn xsinx(x: &Array2<f64>) -> Array1<f64> {
    ((x - 3.5) * ((x - 3.5) / std::f64::consts::PI).mapv(|v| v.sin())).remove_axis(Axis(1))
}

fn main() {
    env_logger::init();

    let xt = arr2(&[[0.0], [5.0], [10.0], [15.0], [18.0], [20.0], [25.0]]);
    let yt = xsinx(&xt);

    println!("Regress gaussian process on 'xsinx' at {}", xt.column(0));
    let data = TrainingData::new(xt, yt, Array1::from_elem(7, 1e-4)).expect("training data");

    // compare a few kernel length scales with the log marginal likelihood
    let (length_scale, lml) = [1., 2., 4., 8.]
        .iter()
        .map(|&l| {
            let gp = GaussianProcess::new(
                ConstantMean(0.),
                SquaredExponential::new(10., l).add(WhiteNoise::new(0.1)),
            );
            let lml = gp
                .log_marginal_likelihood(&data)
                .expect("log marginal likelihood");
            println!("length_scale = {l}, log marginal likelihood = {lml}");
            (l, lml)
        })
        .fold((f64::NAN, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
    println!("Best length scale {length_scale} (lml={lml})");

    let gp = GaussianProcess::new(
        ConstantMean(0.),
        SquaredExponential::new(10., length_scale).add(WhiteNoise::new(0.1)),
    );
    let posterior = gp.regress(&data).expect("GP regression").posterior;
    println!("Posterior {}", posterior);

    let xtest = Array::linspace(0., 25., 26).insert_axis(Axis(1));
    let ytest = xsinx(&xtest);
    // predict values and standard deviations
    let (ypred, yvar) = posterior.predict_valvar(&xtest).expect("GP prediction");
    let ysigma = yvar.mapv(|v| v.sqrt());

    println!("Compute prediction errors (x, err(x), sigma(x))");
    println!(
        "{}",
        concatenate![
            Axis(1),
            xtest,
            (ypred - ytest).insert_axis(Axis(1)),
            ysigma.insert_axis(Axis(1))
        ]
    );

    let samples = posterior.sample_n(&xtest, 3).expect("GP sampling");
    println!("Posterior trajectories:\n{}", samples);
}
